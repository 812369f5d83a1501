//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use mdview::config::AppConfig;
use mdview::http::HttpServer;
use tokio::net::TcpListener;

/// At least 32 bytes, as the validator demands.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// A scratch boundary root with a `Documents` subdirectory, canonicalized
/// so request paths compare cleanly against server responses.
pub struct TestHome {
    _dir: tempfile::TempDir,
    pub root: PathBuf,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir(root.join("Documents")).unwrap();
        Self { _dir: dir, root }
    }

    pub fn docs(&self) -> PathBuf {
        self.root.join("Documents")
    }
}

/// Config confined to the scratch home, with themes stored beside it.
pub fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.debug = true;
    config.session.secret = Some(TEST_SECRET.to_string());
    config.content.root = Some(root.to_path_buf());
    config.content.themes_dir = root.join(".mdview-themes");
    config.content.audit_log = None;
    config
}

/// Start a server on an ephemeral port and return its address.
pub async fn start_server(config: AppConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// Client with a cookie store, so the session cookie survives between the
/// token request and the state-changing request.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}
