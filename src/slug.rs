//! Slug generation and collision probing.
//!
//! A slug is the short, URL-safe name a file is shared under (`/<slug>`).
//! Depending on configuration it is either derived from the uploaded
//! filename (`quarterly-report`, `quarterly-report-2`, …) or drawn at random
//! from a small alphabet (`k3x9qa`).

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Used when a filename has no usable characters at all.
pub const DEFAULT_SLUG: &str = "document";
pub const MAX_SLUG_LEN: usize = 50;

pub const RANDOM_SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const RANDOM_SLUG_LEN: usize = 6;
/// Random draws tried before switching to the longer composite form.
pub const RANDOM_SLUG_ATTEMPTS: usize = 10;

const STRIPPED_EXTENSIONS: [&str; 3] = [".pdf", ".xlsx", ".xls"];
const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// How new slugs are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlugStrategy {
    /// Sanitized filename, with `-2`, `-3`, … appended on collision.
    #[default]
    Filename,
    /// Short random string, retried a bounded number of times.
    Random,
}

impl SlugStrategy {
    /// Slugs to try, in order, for an upload called `filename`. Never ends.
    pub fn candidates(self, filename: &str) -> Box<dyn Iterator<Item = String> + Send> {
        match self {
            SlugStrategy::Filename => Box::new(sequential_candidates(slugify(filename))),
            SlugStrategy::Random => Box::new(random_candidates()),
        }
    }
}

/// Turn a filename into a URL-friendly slug.
///
/// Output only contains `[a-z0-9-]`, never starts or ends with a hyphen and
/// is at most [`MAX_SLUG_LEN`] characters. Applying it to its own output is
/// a no-op.
pub fn slugify(filename: &str) -> String {
    let lower = filename.to_lowercase();
    let stem = STRIPPED_EXTENSIONS
        .iter()
        .find_map(|ext| lower.strip_suffix(ext))
        .unwrap_or(&lower);

    let mut slug = String::with_capacity(stem.len());
    let mut pending_hyphen = false;
    for c in stem.trim().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// `base`, `base-2`, `base-3`, …
pub fn sequential_candidates(base: String) -> impl Iterator<Item = String> + Send {
    std::iter::once(base.clone()).chain((2u64..).map(move |n| format!("{base}-{n}")))
}

/// [`RANDOM_SLUG_ATTEMPTS`] short random slugs, then composite
/// `<random>-<unix millis base36>` slugs forever.
pub fn random_candidates() -> impl Iterator<Item = String> + Send {
    let short = (0..RANDOM_SLUG_ATTEMPTS).map(|_| random_slug(RANDOM_SLUG_LEN));
    let composite = std::iter::repeat_with(|| {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("{}-{}", random_slug(RANDOM_SLUG_LEN), to_base36(millis))
    });
    short.chain(composite)
}

pub fn random_slug(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| RANDOM_SLUG_ALPHABET[rng.gen_range(0..RANDOM_SLUG_ALPHABET.len())] as char)
        .collect()
}

fn to_base36(mut n: u128) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Probe `base`, `base-2`, `base-3`, … and return the first one `in_use`
/// reports as free.
///
/// This only probes; it does not reserve anything. Callers that go on to
/// insert must still handle losing a race for the slug.
pub fn allocate_unique_slug<F, E>(base: &str, mut in_use: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    if !in_use(base)? {
        return Ok(base.to_string());
    }
    let mut counter = 2u64;
    loop {
        let candidate = format!("{base}-{counter}");
        if !in_use(&candidate)? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_encodes_millis() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }
}
