//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. The validator is a pure
//! function and reports every violation, not just the first.

use std::path::Path;

use crate::config::schema::AppConfig;

/// A single semantic violation, pointing at the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate the assembled configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match &config.session.secret {
        Some(secret) if secret.len() < 32 => {
            errors.push(err(
                "session.secret",
                "must be at least 32 bytes of keying material",
            ));
        }
        None if !config.server.debug => {
            errors.push(err(
                "session.secret",
                "required outside debug mode (set MDVIEW_SECRET)",
            ));
        }
        _ => {}
    }

    if config.session.csrf_ttl_secs == 0 {
        errors.push(err("session.csrf_ttl_secs", "must be greater than zero"));
    }

    if config.server.host.is_empty() {
        errors.push(err("server.host", "must not be empty"));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(err("server.request_timeout_secs", "must be greater than zero"));
    }

    if config.limits.max_markdown_bytes == 0 {
        errors.push(err("limits.max_markdown_bytes", "must be greater than zero"));
    }
    if config.limits.max_theme_bytes == 0 {
        errors.push(err("limits.max_theme_bytes", "must be greater than zero"));
    }
    if config.limits.rate_window_secs == 0 {
        errors.push(err("limits.rate_window_secs", "must be greater than zero"));
    }
    if config.limits.rate_max_requests == 0 {
        errors.push(err("limits.rate_max_requests", "must be greater than zero"));
    }

    if Path::new(&config.content.start_dir).is_absolute() {
        errors.push(err(
            "content.start_dir",
            "must be relative to the boundary root",
        ));
    }

    if let Some(root) = &config.content.root {
        if !root.is_dir() {
            errors.push(err("content.root", "must be an existing directory"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
