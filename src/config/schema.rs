//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings (bind host/port, timeouts, debug flag).
    pub server: ServerConfig,

    /// Filesystem locations: boundary root, themes directory, audit log.
    pub content: ContentConfig,

    /// Session cookie and CSRF token settings.
    pub session: SessionConfig,

    /// Size caps and rate-limit window.
    pub limits: LimitsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host (e.g., "127.0.0.1").
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Debug mode: verbose default logging, ephemeral session key allowed.
    pub debug: bool,
}

impl ServerConfig {
    /// Full bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 30,
            debug: false,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Boundary root. `None` means the user's home directory, resolved at
    /// startup.
    pub root: Option<PathBuf>,

    /// Directory the browse endpoint opens when no path is given, relative
    /// to the boundary root.
    pub start_dir: String,

    /// Directory holding theme stylesheets. Created on first save if absent.
    pub themes_dir: PathBuf,

    /// Security/audit log file. `None` disables the file (denials are still
    /// traced).
    pub audit_log: Option<PathBuf>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: None,
            start_dir: "Documents".to_string(),
            themes_dir: PathBuf::from("themes"),
            audit_log: Some(PathBuf::from("mdview-audit.log")),
        }
    }
}

/// Session cookie and CSRF settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie-signing secret, at least 32 bytes. Required unless debug mode
    /// is on, in which case an ephemeral key is generated with a warning.
    pub secret: Option<String>,

    /// CSRF token lifetime in seconds.
    pub csrf_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            csrf_ttl_secs: 3600,
        }
    }
}

/// Size caps and rate-limit window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum Markdown file size served, in bytes.
    pub max_markdown_bytes: u64,

    /// Maximum serialized theme size accepted, in bytes.
    pub max_theme_bytes: usize,

    /// Maximum request body size, in bytes.
    pub max_body_bytes: usize,

    /// Rate-limit window length in seconds.
    pub rate_window_secs: u64,

    /// Requests admitted per client within one window.
    pub rate_max_requests: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_markdown_bytes: 10 * 1024 * 1024,
            max_theme_bytes: 100 * 1024,
            max_body_bytes: 16 * 1024 * 1024,
            rate_window_secs: 60,
            rate_max_requests: 100,
        }
    }
}
