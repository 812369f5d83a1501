//! Bounded single-shot Markdown file reads.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

/// A fully read Markdown file.
#[derive(Debug, Clone, Serialize)]
pub struct MarkdownFile {
    pub path: String,
    pub name: String,
    pub content: String,
    pub size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("file not found")]
    NotFound,
    #[error("not a markdown file")]
    NotMarkdown,
    #[error("file is {size} bytes, cap is {max}")]
    TooLarge { size: u64, max: u64 },
    #[error("file is not valid UTF-8")]
    InvalidEncoding,
    #[error("permission denied")]
    PermissionDenied,
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for ReadError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => ReadError::NotFound,
            io::ErrorKind::PermissionDenied => ReadError::PermissionDenied,
            _ => ReadError::Io(e),
        }
    }
}

/// Read a Markdown file in full, bounded by `max_bytes`.
///
/// Requires `path` to have passed the boundary guard. The size cap is
/// checked against metadata before the body is touched, so a hostile or
/// huge file never reaches memory. No partial or streamed reads.
pub fn read_markdown(path: &Path, max_bytes: u64) -> Result<MarkdownFile, ReadError> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(ReadError::NotFound);
    }

    let is_md = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false);
    if !is_md {
        return Err(ReadError::NotMarkdown);
    }

    let size = meta.len();
    if size > max_bytes {
        return Err(ReadError::TooLarge {
            size,
            max: max_bytes,
        });
    }

    let bytes = fs::read(path)?;
    let content = String::from_utf8(bytes).map_err(|_| ReadError::InvalidEncoding)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(MarkdownFile {
        path: path.to_string_lossy().into_owned(),
        name,
        content,
        size,
    })
}
