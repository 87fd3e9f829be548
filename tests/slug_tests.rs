use std::collections::HashSet;
use std::convert::Infallible;

use docshare::slug::{
    allocate_unique_slug, random_candidates, slugify, SlugStrategy, DEFAULT_SLUG, MAX_SLUG_LEN,
    RANDOM_SLUG_ATTEMPTS, RANDOM_SLUG_LEN,
};

#[test]
fn test_slugify_examples() {
    assert_eq!(slugify("Quarterly Report.pdf"), "quarterly-report");
    assert_eq!(slugify("Budget 2024.XLSX"), "budget-2024");
    assert_eq!(slugify("legacy.xls"), "legacy");
    assert_eq!(slugify("  spaced   out  .pdf"), "spaced-out");
    assert_eq!(slugify("a - b -- c.pdf"), "a-b-c");
    assert_eq!(slugify("Ünïcode & symbols!.pdf"), "ncode-symbols");
    assert_eq!(slugify("under_score.pdf"), "underscore");
    assert_eq!(slugify("notes.txt"), "notestxt");
}

#[test]
fn test_slugify_falls_back_to_default() {
    assert_eq!(slugify(".pdf"), DEFAULT_SLUG);
    assert_eq!(slugify("!!!.xlsx"), DEFAULT_SLUG);
    assert_eq!(slugify(""), DEFAULT_SLUG);
    assert_eq!(slugify("---"), DEFAULT_SLUG);
}

#[test]
fn test_slugify_invariants() {
    let inputs = vec![
        "Quarterly Report.pdf".to_string(),
        "-leading and trailing-.pdf".to_string(),
        "Ünïcode & symbols!.pdf".to_string(),
        "x".repeat(200),
        format!("{} tail.pdf", "word ".repeat(30)),
        "mixed-CASE  name.xlsx".to_string(),
        String::new(),
    ];

    for input in &inputs {
        let slug = slugify(input);
        assert!(!slug.is_empty());
        assert!(slug.len() <= MAX_SLUG_LEN, "{slug} too long");
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        assert!(!slug.starts_with('-') && !slug.ends_with('-'), "{slug}");
        assert!(!slug.contains("--"), "{slug}");
        assert_eq!(slugify(input), slug, "not deterministic");
        assert_eq!(slugify(&slug), slug, "not idempotent");
    }
}

#[test]
fn test_slugify_truncates_without_trailing_hyphen() {
    // 49 letters, a space, then more text: the cut lands right after the hyphen
    let name = format!("{} rest.pdf", "a".repeat(49));
    let slug = slugify(&name);
    assert_eq!(slug, "a".repeat(49));
}

#[test]
fn test_allocate_unique_slug_sequence() {
    let taken: HashSet<&str> = ["report", "report-2", "report-3"].into_iter().collect();

    let slug = allocate_unique_slug("report", |s| Ok::<_, Infallible>(taken.contains(s))).unwrap();
    assert_eq!(slug, "report-4");

    let slug = allocate_unique_slug("fresh", |s| Ok::<_, Infallible>(taken.contains(s))).unwrap();
    assert_eq!(slug, "fresh");
}

#[test]
fn test_allocate_unique_slug_fills_first_gap() {
    let taken: HashSet<&str> = ["report", "report-3"].into_iter().collect();
    let slug = allocate_unique_slug("report", |s| Ok::<_, Infallible>(taken.contains(s))).unwrap();
    assert_eq!(slug, "report-2");
}

#[test]
fn test_allocate_unique_slug_propagates_errors() {
    let result = allocate_unique_slug("report", |_| Err::<bool, _>("db down"));
    assert_eq!(result, Err("db down"));
}

#[test]
fn test_filename_candidates() {
    let candidates: Vec<String> = SlugStrategy::Filename
        .candidates("Report.pdf")
        .take(3)
        .collect();
    assert_eq!(candidates, vec!["report", "report-2", "report-3"]);
}

#[test]
fn test_random_candidates_shape() {
    let candidates: Vec<String> = random_candidates().take(RANDOM_SLUG_ATTEMPTS + 2).collect();

    for short in &candidates[..RANDOM_SLUG_ATTEMPTS] {
        assert_eq!(short.len(), RANDOM_SLUG_LEN);
        assert!(short
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    for composite in &candidates[RANDOM_SLUG_ATTEMPTS..] {
        let (random, millis) = composite.split_once('-').expect("composite slug");
        assert_eq!(random.len(), RANDOM_SLUG_LEN);
        assert!(!millis.is_empty());
        assert!(millis
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
