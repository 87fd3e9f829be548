//! Server-rendered HTML pages. Templates are compiled into the binary.

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

pub const INDEX: &str = "index";
pub const ADMIN: &str = "admin";
pub const LOGIN: &str = "login";
pub const VIEWER: &str = "viewer";
pub const NOT_FOUND: &str = "not_found";

const TEMPLATES: [(&str, &str); 5] = [
    (INDEX, include_str!("../templates/index.hbs")),
    (ADMIN, include_str!("../templates/admin.hbs")),
    (LOGIN, include_str!("../templates/login.hbs")),
    (VIEWER, include_str!("../templates/viewer.hbs")),
    (NOT_FOUND, include_str!("../templates/not_found.hbs")),
];

/// Registry of page templates, built once at startup.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("head", include_str!("../templates/partials/head.hbs"))?;
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, source)?;
        }
        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, RenderError> {
        self.registry.render(name, data)
    }
}

/// Human-readable byte count: `512 B`, `1.5 KB`, `2.0 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
