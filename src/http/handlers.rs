//! Route handlers.
//!
//! Every filesystem-touching handler funnels its path through
//! `resolve_or_deny` before any I/O; denials are logged and audited with
//! the client address and the raw input.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::extract::{ConnectInfo, Path as RoutePath, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use axum_extra::extract::SignedCookieJar;
use serde::{Deserialize, Serialize};

use crate::content::{list_directory, read_markdown, DirEntry, MarkdownFile};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::themes::Theme;

const CSRF_HEADER: &str = "x-csrf-token";

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    current_path: String,
    parent: Option<String>,
    items: Vec<DirEntry>,
}

#[derive(Debug, Serialize)]
pub struct ThemesResponse {
    themes: Vec<Theme>,
}

#[derive(Debug, Deserialize)]
pub struct SaveThemeRequest {
    #[serde(default)]
    id: String,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    css: String,
    csrf_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveThemeResponse {
    success: bool,
    id: String,
}

#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    csrf_token: String,
}

/// `GET /`: the single-page shell.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// `GET /static/app.js`
pub async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        include_str!("../../static/app.js"),
    )
}

/// `GET /static/style.css`
pub async fn app_css() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        include_str!("../../static/style.css"),
    )
}

/// `GET /api/csrf-token`: return the session token, minting one if the
/// session has none or its token expired.
pub async fn csrf_token(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Json<CsrfTokenResponse>) {
    let (jar, token) = state.csrf.get_or_issue(jar);
    (jar, Json(CsrfTokenResponse { csrf_token: token }))
}

/// `GET /api/browse?path=`: list a directory inside the boundary.
pub async fn browse(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<PathQuery>,
) -> Result<Json<BrowseResponse>, ApiError> {
    let raw = match query.path {
        Some(path) => path,
        None => state
            .boundary
            .path()
            .join(&state.config.content.start_dir)
            .to_string_lossy()
            .into_owned(),
    };

    let path = resolve_or_deny(&state, addr, &raw)?;

    let meta = fs::metadata(&path).map_err(|e| metadata_error(e, "path not found"))?;
    if !meta.is_dir() {
        return Err(ApiError::InvalidInput("not a directory".to_string()));
    }

    let items = list_directory(&path)?;

    let parent = if path == state.boundary.path() {
        None
    } else {
        path.parent().map(|p| p.to_string_lossy().into_owned())
    };

    Ok(Json(BrowseResponse {
        current_path: path.to_string_lossy().into_owned(),
        parent,
        items,
    }))
}

/// `GET /api/file?path=`: bounded read of one Markdown file.
pub async fn file(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<PathQuery>,
) -> Result<Json<MarkdownFile>, ApiError> {
    let raw = query
        .path
        .ok_or_else(|| ApiError::InvalidInput("path required".to_string()))?;

    let path = resolve_or_deny(&state, addr, &raw)?;
    let file = read_markdown(&path, state.config.limits.max_markdown_bytes)?;
    Ok(Json(file))
}

/// `GET /api/themes`
pub async fn themes_list(State(state): State<AppState>) -> Json<ThemesResponse> {
    Json(ThemesResponse {
        themes: state.themes.list(),
    })
}

/// `POST /api/themes`: CSRF-guarded create-or-replace of one theme.
pub async fn themes_save(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: SignedCookieJar,
    headers: HeaderMap,
    Json(body): Json<SaveThemeRequest>,
) -> Result<Json<SaveThemeResponse>, ApiError> {
    let presented = headers
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .or(body.csrf_token.as_deref())
        .unwrap_or("");

    if !state.csrf.validate(&jar, presented) {
        tracing::warn!(client = %addr.ip(), "CSRF validation failed");
        state.audit.csrf_failure(addr.ip());
        return Err(ApiError::AccessDenied("csrf validation failed".to_string()));
    }

    if body.id.trim().is_empty() {
        return Err(ApiError::InvalidInput("theme id required".to_string()));
    }

    let theme = state.themes.save(
        &body.id,
        body.name.as_deref(),
        body.description.as_deref().unwrap_or(""),
        &body.css,
    )?;

    tracing::info!(client = %addr.ip(), id = %theme.id, "theme saved");
    state.audit.theme_saved(addr.ip(), &theme.id);

    Ok(Json(SaveThemeResponse {
        success: true,
        id: theme.id,
    }))
}

/// `GET /themes/{file}`: raw stylesheet for the shell's `<link>` tag.
pub async fn theme_css(
    State(state): State<AppState>,
    RoutePath(file): RoutePath<String>,
) -> Result<Response, ApiError> {
    let stem = file.strip_suffix(".css").unwrap_or(&file);
    let path = state
        .themes
        .stylesheet_path(stem)
        .ok_or_else(|| ApiError::NotFound("theme not found".to_string()))?;

    match fs::read_to_string(&path) {
        Ok(css) => Ok(([(header::CONTENT_TYPE, "text/css")], css).into_response()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ApiError::NotFound("theme not found".to_string()))
        }
        Err(e) => Err(ApiError::Internal(e.into())),
    }
}

/// Run a raw path through the boundary guard, logging and auditing any
/// denial before it turns into a response.
fn resolve_or_deny(state: &AppState, addr: SocketAddr, raw: &str) -> Result<PathBuf, ApiError> {
    match state.boundary.resolve(Path::new(raw)) {
        Ok(path) => Ok(path),
        Err(denial) => {
            tracing::warn!(client = %addr.ip(), input = %raw, reason = %denial, "path denied");
            state.audit.denial(addr.ip(), raw, denial);
            Err(denial.into())
        }
    }
}

fn metadata_error(e: io::Error, missing: &str) -> ApiError {
    match e.kind() {
        io::ErrorKind::NotFound => ApiError::NotFound(missing.to_string()),
        io::ErrorKind::PermissionDenied => ApiError::AccessDenied("permission denied".to_string()),
        _ => ApiError::Internal(e.into()),
    }
}
