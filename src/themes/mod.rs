//! CSS theme profile subsystem.
//!
//! Themes are single `.css` files in one directory, each carrying its
//! display metadata in a leading comment block. The store owns slug
//! sanitization, header parse/compose, and atomic writes.

pub mod store;

pub use store::{sanitize_slug, SaveError, Theme, ThemeStore};
