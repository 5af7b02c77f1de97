//! Tests for the render endpoints: binary GET/POST, validation, CORS,
//! and method handling.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn svg_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.svg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/svg+xml")
                .set_body_string("<svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_get_renders_png_from_url() {
    let app = TestApp::new();
    let server = svg_server().await;

    let response = app
        .get(&format!("/{}/a.svg?scale=2&format=png", server.uri()))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert_eq!(
        response.header("cache-control"),
        Some("public, max-age=86400")
    );
    assert!(response.is_png());
    assert_eq!(app.connector.connect_count(), 1);
}

#[tokio::test]
async fn test_every_response_allows_any_origin() {
    let app = TestApp::new();

    let response = app.get("/").await;
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));

    let response = app.post_json("/", "{").await;
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn test_get_without_target_is_missing_url() {
    let app = TestApp::new();

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "MISSING_SVG_URL");
    assert_eq!(response.json()["success"], serde_json::json!(false));
}

#[tokio::test]
async fn test_get_with_malformed_target_is_invalid_url() {
    let app = TestApp::new();

    let response = app.get("/not-a-url").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_SVG_URL");
}

#[tokio::test]
async fn test_get_scale_out_of_range_is_scale_error() {
    let app = TestApp::new();

    // Validation happens before any fetch, so the target never resolves
    let response = app.get("/https://example.com/a.svg?scale=0").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_SCALE");

    let response = app.get("/https://example.com/a.svg?scale=11").await;
    assert_eq!(response.error_code(), "INVALID_SCALE");

    let response = app.get("/https://example.com/a.svg?scale=abc").await;
    assert_eq!(response.error_code(), "INVALID_SCALE");
}

#[tokio::test]
async fn test_get_unsupported_format() {
    let app = TestApp::new();

    let response = app.get("/https://example.com/a.svg?format=bmp").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "UNSUPPORTED_FORMAT");
    assert_eq!(app.connector.connect_count(), 0);
}

#[tokio::test]
async fn test_get_blocked_domain() {
    let app = TestApp::with_config(svgsnap::models::AppConfig {
        browserless_token: "test-token".to_string(),
        ..Default::default()
    });

    let response = app.get("/http://127.0.0.1:1/a.svg").await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "DOMAIN_BLOCKED");
}

#[tokio::test]
async fn test_get_domain_not_in_allow_list() {
    let app = TestApp::with_config(svgsnap::models::AppConfig {
        browserless_token: "test-token".to_string(),
        blocked_domains: Vec::new(),
        allowed_domains: vec!["example.org".to_string()],
        ..Default::default()
    });

    let response = app.get("/https://example.com/a.svg").await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "DOMAIN_NOT_ALLOWED");
}

#[tokio::test]
async fn test_get_fetch_failure_is_not_found() {
    let app = TestApp::new();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = app.get(&format!("/{}/missing.svg", server.uri())).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "SVG_FETCH_FAILED");
}

#[tokio::test]
async fn test_get_non_svg_content_is_unprocessable() {
    let app = TestApp::new();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let response = app.get(&format!("/{}/page", server.uri())).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), "INVALID_SVG_CONTENT");
}

#[tokio::test]
async fn test_post_renders_inline_svg() {
    let app = TestApp::new();

    let response = app.post_json("/", r#"{"svg": "<svg/>"}"#).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert!(response.is_png());
}

#[tokio::test]
async fn test_post_jpeg_content_type() {
    let app = TestApp::new();

    let response = app
        .post_json("/", r#"{"svg": "<svg/>", "format": "jpeg", "quality": 75}"#)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/jpeg"));
}

#[tokio::test]
async fn test_post_pdf_content_type() {
    let app = TestApp::new();

    let response = app
        .post_json("/", r#"{"svg": "<svg/>", "format": "pdf"}"#)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("application/pdf"));
    assert!(response.body.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_post_missing_svg() {
    let app = TestApp::new();

    let response = app.post_json("/", r#"{"format": "png"}"#).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "MISSING_SVG_CONTENT");
}

#[tokio::test]
async fn test_post_invalid_json() {
    let app = TestApp::new();

    let response = app.post_json("/", "{not json").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_JSON");
}

#[tokio::test]
async fn test_post_oversized_svg_never_renders() {
    let app = TestApp::with_config(svgsnap::models::AppConfig {
        browserless_token: "test-token".to_string(),
        blocked_domains: Vec::new(),
        max_svg_size: 16,
        ..Default::default()
    });

    let big = format!(r#"{{"svg": "<svg>{}</svg>"}}"#, "x".repeat(64));
    let response = app.post_json("/", &big).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "SVG_TOO_LARGE");
    assert_eq!(app.connector.connect_count(), 0);
}

#[tokio::test]
async fn test_post_wait_for_accepted() {
    let app = TestApp::new();

    let response = app
        .post_json("/", r#"{"svg": "<svg/>", "waitFor": 0}"#)
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_options_preflight() {
    let app = TestApp::new();

    for route in ["/", "/https://example.com/a.svg"] {
        let response = app.options(route).await;

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());
        assert_eq!(
            response.header("access-control-allow-methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(
            response.header("access-control-allow-headers"),
            Some("Content-Type")
        );
        assert_eq!(response.header("access-control-max-age"), Some("86400"));
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    }
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = TestApp::new();

    let response = app.delete("/").await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.error_code(), "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "OK");
}
