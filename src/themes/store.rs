//! Theme file persistence and metadata parsing.
//!
//! On-disk format, one file per theme at `<id>.css`:
//!
//! ```text
//! /*
//! Display Name
//! Free-form description, possibly
//! spanning several lines
//! */
//!
//! .markdown-body { ... }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A theme as listed to the client. The CSS body stays on disk; the `file`
/// field is the URL the shell links to apply it.
#[derive(Debug, Clone, Serialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub description: String,
    pub file: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("theme id is empty after sanitization")]
    InvalidId,
    #[error("theme is {size} bytes serialized, cap is {max}")]
    TooLarge { size: usize, max: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Lists and writes theme files under one directory.
pub struct ThemeStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ThemeStore {
    pub fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    /// All parseable themes, in byte-wise filename order. A missing theme
    /// directory is an empty listing; an unreadable individual file is
    /// logged and skipped.
    pub fn list(&self) -> Vec<Theme> {
        let Ok(children) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut paths: Vec<PathBuf> = children
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("css"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut themes = Vec::new();
        for path in paths {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable theme");
                    continue;
                }
            };

            let (name, description) = match parse_header(&content) {
                Some((name, description)) => (name, description),
                None => (derive_name(&stem), String::new()),
            };

            themes.push(Theme {
                file: format!("/themes/{}.css", stem),
                id: stem,
                name,
                description,
            });
        }
        themes
    }

    /// Create or replace the theme `<id>.css`.
    ///
    /// The id is reduced to the slug alphabet; the metadata fields have
    /// comment delimiters neutralized so they cannot terminate the header
    /// early. The write goes through a temp file and rename, so a partial
    /// theme is never observable.
    pub fn save(
        &self,
        raw_id: &str,
        name: Option<&str>,
        description: &str,
        css: &str,
    ) -> Result<Theme, SaveError> {
        let id = sanitize_slug(raw_id);
        if id.is_empty() {
            return Err(SaveError::InvalidId);
        }

        let name = neutralize_comment(name.unwrap_or(&id));
        let description = neutralize_comment(description);

        let serialized = format!("/*\n{}\n{}\n*/\n\n{}", name, description, css);
        if serialized.len() > self.max_bytes {
            return Err(SaveError::TooLarge {
                size: serialized.len(),
                max: self.max_bytes,
            });
        }

        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!("{}.css.tmp", id));
        let path = self.dir.join(format!("{}.css", id));
        fs::write(&tmp, &serialized)?;
        fs::rename(&tmp, &path)?;

        Ok(Theme {
            file: format!("/themes/{}.css", id),
            id,
            name,
            description,
        })
    }

    /// Disk path of a theme's stylesheet, with the id sanitized so the
    /// lookup cannot leave the theme directory. Existence is not checked.
    pub fn stylesheet_path(&self, raw_id: &str) -> Option<PathBuf> {
        let id = sanitize_slug(raw_id);
        if id.is_empty() {
            return None;
        }
        Some(self.dir.join(format!("{}.css", id)))
    }
}

/// Reduce an id to lowercase ASCII alphanumerics, `-`, and `_`.
pub fn sanitize_slug(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// Pull `(name, description)` out of a leading `/* ... */` block.
fn parse_header(content: &str) -> Option<(String, String)> {
    if !content.starts_with("/*") {
        return None;
    }
    let end = content.find("*/")?;
    let inner = content[2..end].trim();

    let mut lines = inner.lines();
    let name = lines.next()?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let description = lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some((name, description))
}

/// Display name derived from a file stem: separators to spaces, title case.
fn derive_name(stem: &str) -> String {
    stem.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Break comment delimiters in user-supplied header fields.
fn neutralize_comment(text: &str) -> String {
    text.replace("*/", "* /").replace("/*", "/ *")
}
