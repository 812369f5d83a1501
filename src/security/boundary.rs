//! Path containment guard.
//!
//! Every filesystem-touching endpoint resolves its user-supplied path here
//! before any I/O. The guard canonicalizes the path, refuses anything that
//! is or passes through a symlink, and proves the result lies within the
//! boundary root.
//!
//! # Design Decisions
//! - Containment is a string-prefix check after canonicalization, with a
//!   path separator appended to the root so a sibling like `/home/alicexyz`
//!   is never admitted by root `/home/alice`
//! - Symlinks are rejected outright, even when the target is inside the
//!   boundary; the inspection walks the supplied path with `symlink_metadata`
//!   so intermediate links are caught as well as the final component
//! - A missing final component is not an error here: the deepest existing
//!   ancestor is canonicalized and the remainder appended, so handlers can
//!   distinguish "outside the boundary" (403) from "inside but absent" (404)

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Reason a path was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The path could not be canonicalized (malformed, relative, or an
    /// unresolvable parent).
    InvalidPath,
    /// The path is, or passes through, a symlink.
    SymlinkRejected,
    /// The canonical path lies outside the boundary root.
    OutsideBoundary,
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Denial::InvalidPath => write!(f, "invalid path"),
            Denial::SymlinkRejected => write!(f, "symlink rejected"),
            Denial::OutsideBoundary => write!(f, "outside boundary"),
        }
    }
}

/// The single directory outside of which no file operation is permitted.
///
/// Fixed at process start; the stored form is canonical so the prefix
/// comparison never sees unresolved links or `..` segments.
#[derive(Debug, Clone)]
pub struct BoundaryRoot {
    canonical: PathBuf,
    /// Canonical root with a trailing separator, precomputed for the
    /// prefix check.
    prefix: String,
}

impl BoundaryRoot {
    /// Canonicalize `root` and fix it as the boundary.
    pub fn new(root: &Path) -> io::Result<Self> {
        let canonical = fs::canonicalize(root)?;
        let mut prefix = canonical.to_string_lossy().into_owned();
        if !prefix.ends_with(MAIN_SEPARATOR) {
            prefix.push(MAIN_SEPARATOR);
        }
        Ok(Self { canonical, prefix })
    }

    /// The canonical boundary directory.
    pub fn path(&self) -> &Path {
        &self.canonical
    }

    /// Resolve a user-supplied path and prove containment.
    ///
    /// Returns the canonical path on success. The final component may not
    /// exist yet; everything that does exist has been resolved, and none of
    /// it is a symlink.
    pub fn resolve(&self, raw: &Path) -> Result<PathBuf, Denial> {
        if !raw.is_absolute() {
            return Err(Denial::InvalidPath);
        }

        let canonical = canonicalize_allow_missing(raw).map_err(|_| Denial::InvalidPath)?;

        if traverses_symlink(raw) {
            return Err(Denial::SymlinkRejected);
        }

        if canonical == self.canonical {
            return Ok(canonical);
        }
        if canonical.to_string_lossy().starts_with(&self.prefix) {
            return Ok(canonical);
        }
        Err(Denial::OutsideBoundary)
    }
}

/// Canonicalize a path whose final components may not exist: the deepest
/// existing ancestor is resolved and the missing remainder appended.
fn canonicalize_allow_missing(path: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let parent = path
                .parent()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no parent"))?;
            let name = path
                .file_name()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no file name"))?;
            Ok(canonicalize_allow_missing(parent)?.join(name))
        }
        Err(e) => Err(e),
    }
}

/// Walk the supplied path front to back, checking each existing prefix with
/// a no-follow metadata call. Missing components cannot be symlinks.
fn traverses_symlink(path: &Path) -> bool {
    let mut probe = PathBuf::new();
    for component in path.components() {
        probe.push(component.as_os_str());
        if matches!(component, Component::RootDir | Component::CurDir) {
            continue;
        }
        if let Ok(meta) = fs::symlink_metadata(&probe) {
            if meta.file_type().is_symlink() {
                return true;
            }
        }
    }
    false
}
