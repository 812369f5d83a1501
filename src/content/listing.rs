//! Directory enumeration for the browse endpoint.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

/// Entry classification for the browse listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One visible child of a browsed directory.
///
/// Hidden entries and symlinks never appear; plain files appear only with a
/// `.md` extension.
#[derive(Debug, Clone, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_markdown: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("permission denied")]
    PermissionDenied,
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for ListError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::PermissionDenied {
            ListError::PermissionDenied
        } else {
            ListError::Io(e)
        }
    }
}

/// Enumerate the visible children of `dir`, directories first, then
/// case-insensitive name order.
///
/// Requires `dir` to have passed the boundary guard and to be a directory.
/// A metadata failure on a single entry drops that entry; a failure opening
/// `dir` itself fails the whole listing.
pub fn list_directory(dir: &Path) -> Result<Vec<DirEntry>, ListError> {
    let mut entries = Vec::new();

    for child in fs::read_dir(dir)? {
        // Per-entry failures drop the entry, not the listing.
        let Ok(child) = child else { continue };
        let name = child.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let Ok(file_type) = child.file_type() else {
            continue;
        };
        if file_type.is_symlink() {
            continue;
        }

        let path = child.path();
        if file_type.is_dir() {
            entries.push(DirEntry {
                name,
                path: path.to_string_lossy().into_owned(),
                kind: EntryKind::Directory,
                size: None,
                has_markdown: Some(has_markdown(&path)),
            });
        } else if is_markdown_name(&name) {
            let Ok(meta) = child.metadata() else {
                continue;
            };
            entries.push(DirEntry {
                name,
                path: path.to_string_lossy().into_owned(),
                kind: EntryKind::File,
                size: Some(meta.len()),
                has_markdown: None,
            });
        }
    }

    entries.sort_by(|a, b| {
        let a_key = (a.kind != EntryKind::Directory, a.name.to_lowercase());
        let b_key = (b.kind != EntryKind::Directory, b.name.to_lowercase());
        a_key.cmp(&b_key)
    });

    Ok(entries)
}

/// Markdown-presence probe for a subdirectory.
///
/// Two phases: immediate children first, then a full recursive walk only
/// when the shallow pass finds nothing. Symlinks are never followed and
/// hidden directories are not descended into.
fn has_markdown(dir: &Path) -> bool {
    if let Ok(children) = fs::read_dir(dir) {
        for child in children.flatten() {
            let Ok(file_type) = child.file_type() else {
                continue;
            };
            let name = child.file_name().to_string_lossy().into_owned();
            if file_type.is_file() && !name.starts_with('.') && is_markdown_name(&name) {
                return true;
            }
        }
    }

    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .flatten()
        .any(|entry| {
            entry.file_type().is_file() && is_markdown_name(&entry.file_name().to_string_lossy())
        })
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}
