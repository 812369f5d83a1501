//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, body limit,
//!   security headers, rate limiting on the API subtree)
//! - Construct the shared services: boundary guard, theme store, rate
//!   limiter, CSRF guard, audit log
//! - Bind the server to a listener and run to shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum::{middleware, routing::get, Router};
use axum_extra::extract::cookie::Key;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::request::request_id;
use crate::security::audit::AuditLog;
use crate::security::boundary::BoundaryRoot;
use crate::security::csrf::CsrfGuard;
use crate::security::headers::security_headers;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiterState};
use crate::themes::ThemeStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub boundary: Arc<BoundaryRoot>,
    pub themes: Arc<ThemeStore>,
    pub limiter: Arc<RateLimiterState>,
    pub csrf: CsrfGuard,
    pub audit: Arc<AuditLog>,
    cookie_key: Key,
}

/// Lets `SignedCookieJar` pull its signing key out of the state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}

/// HTTP server for the Markdown viewer.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Resolves the boundary root and derives the cookie-signing key; with
    /// no secret configured (debug mode only) an ephemeral key is generated
    /// and sessions will not survive a restart.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let root_path = match &config.content.root {
            Some(path) => path.clone(),
            None => dirs::home_dir().context("could not determine the home directory")?,
        };
        let boundary = Arc::new(
            BoundaryRoot::new(&root_path)
                .with_context(|| format!("boundary root {} unusable", root_path.display()))?,
        );

        let cookie_key = match &config.session.secret {
            Some(secret) => Key::derive_from(secret.as_bytes()),
            None => {
                tracing::warn!(
                    "no session secret configured; using an ephemeral signing key, \
                     sessions will NOT survive a restart"
                );
                Key::generate()
            }
        };

        let state = AppState {
            boundary,
            themes: Arc::new(ThemeStore::new(
                config.content.themes_dir.clone(),
                config.limits.max_theme_bytes,
            )),
            limiter: Arc::new(RateLimiterState::new(
                Duration::from_secs(config.limits.rate_window_secs),
                config.limits.rate_max_requests,
            )),
            csrf: CsrfGuard::new(Duration::from_secs(config.session.csrf_ttl_secs)),
            audit: Arc::new(AuditLog::open(config.content.audit_log.as_deref())),
            cookie_key,
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/csrf-token", get(handlers::csrf_token))
            .route("/browse", get(handlers::browse))
            .route("/file", get(handlers::file))
            .route(
                "/themes",
                get(handlers::themes_list).post(handlers::themes_save),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ));

        Router::new()
            .route("/", get(handlers::index))
            .route("/static/app.js", get(handlers::app_js))
            .route("/static/style.css", get(handlers::app_css))
            .route("/themes/{file}", get(handlers::theme_css))
            .nest("/api", api)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(middleware::from_fn(security_headers))
            .layer(middleware::from_fn(request_id))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
