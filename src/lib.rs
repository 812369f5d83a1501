//! Boundary-guarded Markdown browsing service library.

pub mod config;
pub mod content;
pub mod http;
pub mod observability;
pub mod security;
pub mod themes;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use security::boundary::BoundaryRoot;
