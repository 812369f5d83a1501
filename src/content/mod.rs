//! Markdown content subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted path (security::boundary)
//!     → listing.rs (enumerate a directory, classify entries)
//!     → markdown.rs (bounded single-shot read of one file)
//! ```
//!
//! Both modules require their argument to have already passed the boundary
//! guard; neither follows symlinks or surfaces hidden entries.

pub mod listing;
pub mod markdown;

pub use listing::{list_directory, DirEntry, EntryKind, ListError};
pub use markdown::{read_markdown, MarkdownFile, ReadError};
