//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both the
//! production server and integration tests.

use axum::{
    http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::api;
use crate::models::AppConfig;
use crate::services::{
    BrowserConnector, CdpConnector, RenderPipeline, StorageCache, SvgFetcher, TokenPool,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenPool>,
    pub pipeline: Arc<RenderPipeline>,
    pub fetcher: Arc<SvgFetcher>,
    pub storage: Arc<StorageCache>,
}

/// Create application state with the production CDP connector.
pub fn create_app_state(config: Arc<AppConfig>) -> AppState {
    create_app_state_with(config, Arc::new(CdpConnector), None)
}

/// Create application state with an explicit connector and optional object
/// store, for tests and alternative deployments.
pub fn create_app_state_with(
    config: Arc<AppConfig>,
    connector: Arc<dyn BrowserConnector>,
    store: Option<Arc<dyn crate::services::ObjectStore>>,
) -> AppState {
    let tokens = Arc::new(TokenPool::new(&config.browserless_token));
    let pipeline = Arc::new(RenderPipeline::new(
        connector,
        tokens.clone(),
        config.clone(),
    ));
    let fetcher = Arc::new(SvgFetcher::from_config(&config));
    let storage = Arc::new(match store {
        Some(store) => StorageCache::with_store(store),
        None => StorageCache::from_config(&config),
    });

    AppState {
        config,
        tokens,
        pipeline,
        fetcher,
        storage,
    }
}

/// Build the API router with all endpoints and middleware.
///
/// Every response carries `Access-Control-Allow-Origin: *`; preflight is
/// answered explicitly with 204 so the body stays empty.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(api::handle_get_root)
                .post(api::handle_post)
                .options(api::handle_preflight),
        )
        .route(
            "/*target",
            get(api::handle_get).options(api::handle_preflight),
        )
        // Health check
        .route("/health", get(|| async { "OK" }))
        .method_not_allowed_fallback(api::handle_method_not_allowed)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            axum::http::HeaderValue::from_static("*"),
        ))
}
