//! mdview: a local Markdown viewer service.
//!
//! Serves a single-page shell for browsing Markdown files under the user's
//! home directory and managing CSS theme profiles.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                   MDVIEW                     │
//!                    │                                              │
//!   Browser request  │  ┌────────┐   ┌──────────┐   ┌───────────┐  │
//!   ─────────────────┼─▶│  http  │──▶│ security │──▶│  content  │  │
//!                    │  │ router │   │ boundary │   │ lister /  │  │
//!                    │  └────────┘   │  guard   │   │  reader   │  │
//!                    │               └──────────┘   └───────────┘  │
//!                    │                                              │
//!                    │  ┌────────────────────────────────────────┐  │
//!                    │  │         Cross-Cutting Concerns         │  │
//!                    │  │ ┌────────┐ ┌───────────┐ ┌──────────┐  │  │
//!                    │  │ │ config │ │ rate limit│ │  audit   │  │  │
//!                    │  │ │        │ │ csrf/hdrs │ │  log     │  │  │
//!                    │  │ └────────┘ └───────────┘ └──────────┘  │  │
//!                    │  └────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod content;
pub mod http;
pub mod themes;

// Cross-cutting concerns
pub mod observability;
pub mod security;

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use crate::config::loader;
use crate::http::HttpServer;

/// CLI arguments; every flag falls back to an `MDVIEW_*` environment
/// variable, and all of them override the optional config file.
#[derive(Parser, Debug)]
#[command(name = "mdview", version, about = "Local Markdown viewer service")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "MDVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Bind host.
    #[arg(long, env = "MDVIEW_BIND")]
    bind: Option<String>,

    /// Bind port.
    #[arg(short, long, env = "MDVIEW_PORT")]
    port: Option<u16>,

    /// Boundary root; no file access is permitted outside it.
    /// Defaults to the user's home directory.
    #[arg(long, env = "MDVIEW_ROOT")]
    root: Option<PathBuf>,

    /// Directory holding theme stylesheets.
    #[arg(long, env = "MDVIEW_THEMES_DIR")]
    themes_dir: Option<PathBuf>,

    /// Session-signing secret (at least 32 bytes). Required unless --debug.
    #[arg(long, env = "MDVIEW_SECRET")]
    secret: Option<String>,

    /// Security/audit log file.
    #[arg(long, env = "MDVIEW_AUDIT_LOG")]
    audit_log: Option<PathBuf>,

    /// Debug mode: verbose logging and an ephemeral session key if no
    /// secret is configured.
    #[arg(long, env = "MDVIEW_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    observability::logging::init(args.debug);

    tracing::info!("mdview v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = loader::load_config(args.config.as_deref())?;

    // CLI / environment overrides on top of the file.
    if args.debug {
        config.server.debug = true;
    }
    if let Some(bind) = args.bind {
        config.server.host = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(root) = args.root {
        config.content.root = Some(root);
    }
    if let Some(dir) = args.themes_dir {
        config.content.themes_dir = dir;
    }
    if let Some(secret) = args.secret {
        config.session.secret = Some(secret);
    }
    if let Some(path) = args.audit_log {
        config.content.audit_log = Some(path);
    }

    loader::validate(&config)?;

    tracing::info!(
        bind_address = %config.server.bind_address(),
        themes_dir = %config.content.themes_dir.display(),
        debug = config.server.debug,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(config.server.bind_address()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
