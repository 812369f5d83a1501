//! End-to-end tests over a real listener.

use std::fs;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;
use common::{client, start_server, test_config, TestHome};

#[tokio::test]
async fn test_browse_end_to_end() {
    let home = TestHome::new();
    let docs = home.docs();
    fs::create_dir(docs.join("guide")).unwrap();
    fs::write(docs.join("guide").join("nested.md"), "# nested").unwrap();
    fs::write(docs.join("readme.md"), "# readme").unwrap();

    let addr = start_server(test_config(&home.root)).await;
    let response = client()
        .get(format!("http://{}/api/browse", addr))
        .query(&[("path", docs.to_str().unwrap())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["current_path"], docs.to_str().unwrap());
    assert_eq!(body["parent"], home.root.to_str().unwrap());

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Directories sort before files.
    assert_eq!(items[0]["name"], "guide");
    assert_eq!(items[0]["type"], "directory");
    assert_eq!(items[0]["has_markdown"], true);
    assert_eq!(items[1]["name"], "readme.md");
    assert_eq!(items[1]["type"], "file");
    assert_eq!(items[1]["size"], 8);
}

#[tokio::test]
async fn test_browse_defaults_to_documents() {
    let home = TestHome::new();
    fs::write(home.docs().join("hello.md"), "# hi").unwrap();

    let addr = start_server(test_config(&home.root)).await;
    let body: Value = client()
        .get(format!("http://{}/api/browse", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["current_path"], home.docs().to_str().unwrap());
    assert_eq!(body["items"][0]["name"], "hello.md");
}

#[tokio::test]
async fn test_browse_at_root_has_no_parent() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;

    let body: Value = client()
        .get(format!("http://{}/api/browse", addr))
        .query(&[("path", home.root.to_str().unwrap())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["parent"], Value::Null);
}

#[tokio::test]
async fn test_browse_outside_boundary_denied_and_audited() {
    let home = TestHome::new();
    let audit = home.root.join(".audit.log");
    let mut config = test_config(&home.root);
    config.content.audit_log = Some(audit.clone());

    let addr = start_server(config).await;
    let response = client()
        .get(format!("http://{}/api/browse", addr))
        .query(&[("path", "/etc")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "access_denied");

    let log = fs::read_to_string(&audit).unwrap();
    assert!(log.contains("DENY_BOUNDARY"));
    assert!(log.contains("client=127.0.0.1"));
    assert!(log.contains("/etc"));
}

#[tokio::test]
async fn test_browse_sibling_prefix_denied() {
    let parent = tempfile::tempdir().unwrap();
    let root = parent.path().canonicalize().unwrap();
    let home = root.join("alice");
    let evil = root.join("alicexyz");
    fs::create_dir(&home).unwrap();
    fs::create_dir(home.join("Documents")).unwrap();
    fs::create_dir(&evil).unwrap();

    let addr = start_server(test_config(&home)).await;
    let response = client()
        .get(format!("http://{}/api/browse", addr))
        .query(&[("path", evil.to_str().unwrap())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_browse_missing_path_is_404() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;

    let response = client()
        .get(format!("http://{}/api/browse", addr))
        .query(&[("path", home.root.join("nope").to_str().unwrap())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_browse_on_file_is_400() {
    let home = TestHome::new();
    let file = home.docs().join("plain.md");
    fs::write(&file, "# plain").unwrap();

    let addr = start_server(test_config(&home.root)).await;
    let response = client()
        .get(format!("http://{}/api/browse", addr))
        .query(&[("path", file.to_str().unwrap())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_denied_even_inside_boundary() {
    let home = TestHome::new();
    let real = home.docs().join("real.md");
    fs::write(&real, "# real").unwrap();
    let link = home.docs().join("link.md");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let addr = start_server(test_config(&home.root)).await;
    let response = client()
        .get(format!("http://{}/api/file", addr))
        .query(&[("path", link.to_str().unwrap())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_file_roundtrip() {
    let home = TestHome::new();
    let path = home.docs().join("notes.md");
    fs::write(&path, "# Notes\n\ncontent here").unwrap();

    let addr = start_server(test_config(&home.root)).await;
    let body: Value = client()
        .get(format!("http://{}/api/file", addr))
        .query(&[("path", path.to_str().unwrap())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["name"], "notes.md");
    assert_eq!(body["content"], "# Notes\n\ncontent here");
    assert_eq!(body["size"], 21);
    assert_eq!(body["path"], path.to_str().unwrap());
}

#[tokio::test]
async fn test_file_requires_path_param() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;

    let response = client()
        .get(format!("http://{}/api/file", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_file_rejects_non_markdown() {
    let home = TestHome::new();
    let path = home.docs().join("secrets.txt");
    fs::write(&path, "hush").unwrap();

    let addr = start_server(test_config(&home.root)).await;
    let response = client()
        .get(format!("http://{}/api/file", addr))
        .query(&[("path", path.to_str().unwrap())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_file_size_cap() {
    let home = TestHome::new();
    let at_cap = home.docs().join("at-cap.md");
    let over = home.docs().join("over.md");
    fs::write(&at_cap, vec![b'x'; 64]).unwrap();
    fs::write(&over, vec![b'x'; 65]).unwrap();

    let mut config = test_config(&home.root);
    config.limits.max_markdown_bytes = 64;
    let addr = start_server(config).await;

    let ok = client()
        .get(format!("http://{}/api/file", addr))
        .query(&[("path", at_cap.to_str().unwrap())])
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let too_large = client()
        .get(format!("http://{}/api/file", addr))
        .query(&[("path", over.to_str().unwrap())])
        .send()
        .await
        .unwrap();
    assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_csrf_token_persists_and_guards_theme_save() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;
    let client = client();

    let first: Value = client
        .get(format!("http://{}/api/csrf-token", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = client
        .get(format!("http://{}/api/csrf-token", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let token = first["csrf_token"].as_str().unwrap();
    assert_eq!(token, second["csrf_token"].as_str().unwrap());

    // Valid token accepted.
    let saved = client
        .post(format!("http://{}/api/themes", addr))
        .header("X-CSRF-Token", token)
        .json(&json!({"id": "dark", "name": "Dark", "css": "body { color: #eee }"}))
        .send()
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::OK);
    let saved: Value = saved.json().await.unwrap();
    assert_eq!(saved["success"], true);
    assert_eq!(saved["id"], "dark");

    // Wrong token rejected.
    let rejected = client
        .post(format!("http://{}/api/themes", addr))
        .header("X-CSRF-Token", "invalid_token")
        .json(&json!({"id": "dark", "css": ".x{}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);

    // No session at all rejected.
    let no_session = reqwest::Client::new()
        .post(format!("http://{}/api/themes", addr))
        .header("X-CSRF-Token", token)
        .json(&json!({"id": "dark", "css": ".x{}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(no_session.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_csrf_token_in_body_accepted() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;
    let client = client();

    let token: Value = client
        .get(format!("http://{}/api/csrf-token", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let saved = client
        .post(format!("http://{}/api/themes", addr))
        .json(&json!({
            "id": "light",
            "css": "body{}",
            "csrf_token": token["csrf_token"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_csrf_token_rejected() {
    let home = TestHome::new();
    let mut config = test_config(&home.root);
    config.session.csrf_ttl_secs = 1;
    let addr = start_server(config).await;
    let client = client();

    let token: Value = client
        .get(format!("http://{}/api/csrf-token", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let response = client
        .post(format!("http://{}/api/themes", addr))
        .header("X-CSRF-Token", token["csrf_token"].as_str().unwrap())
        .json(&json!({"id": "stale", "css": ".x{}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_theme_save_list_and_stylesheet_roundtrip() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;
    let client = client();

    let token: Value = client
        .get(format!("http://{}/api/csrf-token", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Traversal id sanitized, header breakout neutralized.
    let saved: Value = client
        .post(format!("http://{}/api/themes", addr))
        .header("X-CSRF-Token", token["csrf_token"].as_str().unwrap())
        .json(&json!({
            "id": "../../Evil Theme",
            "name": "name */ truncated?",
            "description": "a theme",
            "css": ".real { color: red }",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["id"], "eviltheme");

    let themes: Value = client
        .get(format!("http://{}/api/themes", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let theme = &themes["themes"][0];
    assert_eq!(theme["id"], "eviltheme");
    assert_eq!(theme["name"], "name * / truncated?");
    assert_eq!(theme["description"], "a theme");
    assert_eq!(theme["file"], "/themes/eviltheme.css");

    let css = client
        .get(format!("http://{}/themes/eviltheme.css", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(css.status(), StatusCode::OK);
    assert!(css
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/css"));
    assert!(css.text().await.unwrap().ends_with(".real { color: red }"));
}

#[tokio::test]
async fn test_theme_save_requires_id() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;
    let client = client();

    let token: Value = client
        .get(format!("http://{}/api/csrf-token", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .post(format!("http://{}/api/themes", addr))
        .header("X-CSRF-Token", token["csrf_token"].as_str().unwrap())
        .json(&json!({"id": "", "css": ".x{}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_theme_stylesheet_is_404() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;

    let response = client()
        .get(format!("http://{}/themes/absent.css", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit_trips_and_reports_429() {
    let home = TestHome::new();
    let mut config = test_config(&home.root);
    config.limits.rate_max_requests = 3;
    let addr = start_server(config).await;
    let client = client();

    for _ in 0..3 {
        let ok = client
            .get(format!("http://{}/api/themes", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }

    let limited = client
        .get(format!("http://{}/api/themes", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = limited.json().await.unwrap();
    assert_eq!(body["error"], "rate_limited");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;

    for path in ["/", "/api/themes", "/static/app.js"] {
        let response = client()
            .get(format!("http://{}{}", addr, path))
            .send()
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff", "{}", path);
        assert_eq!(headers["x-frame-options"], "DENY", "{}", path);
        assert!(headers.contains_key("content-security-policy"), "{}", path);
        assert!(headers.contains_key("strict-transport-security"), "{}", path);
        assert!(headers.contains_key("x-request-id"), "{}", path);
    }
}

#[tokio::test]
async fn test_shell_served_at_root() {
    let home = TestHome::new();
    let addr = start_server(test_config(&home.root)).await;

    let response = client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("<title>mdview</title>"));
    assert!(html.contains("/static/app.js"));
}
