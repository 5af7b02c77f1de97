//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use svgsnap::models::AppConfig;
use svgsnap::server::{build_router, create_app_state_with};

use super::{InMemoryStore, MockConnector};

/// Configuration suitable for tests: no domain policy (mock servers live
/// on loopback), a real-looking token, and no settling wait.
pub fn test_config() -> AppConfig {
    AppConfig {
        browserless_token: "test-token".to_string(),
        blocked_domains: Vec::new(),
        default_wait_for: 0,
        ..Default::default()
    }
}

/// Test application with router and direct access to the mocks.
pub struct TestApp {
    router: axum::Router,
    pub connector: Arc<MockConnector>,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let connector = MockConnector::new();
        let store = Arc::new(InMemoryStore::default());

        let state = create_app_state_with(
            Arc::new(config),
            connector.clone(),
            Some(store.clone()),
        );

        Self {
            router: build_router(state),
            connector,
            store,
        }
    }

    /// App without any object store configured, to exercise the storage
    /// configuration error path.
    pub fn without_storage() -> Self {
        let connector = MockConnector::new();
        let store = Arc::new(InMemoryStore::default());

        let state = create_app_state_with(Arc::new(test_config()), connector.clone(), None);

        Self {
            router: build_router(state),
            connector,
            store,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, path: &str, body: &str) -> TestResponse {
        self.request(
            Request::post(path)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn options(&self, path: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("OPTIONS")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Machine-readable code from an error body.
    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .expect("error body should carry a code")
            .to_string()
    }

    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == super::mock_browser::PNG_MAGIC
    }
}
