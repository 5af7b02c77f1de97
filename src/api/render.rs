//! Render request handlers.
//!
//! GET takes the target SVG URL as the request path remainder, POST takes
//! inline SVG in a JSON body. Both normalize options, render through the
//! pipeline, and deliver either the bytes or a signed storage URL.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use url::Url;

use crate::error::ServiceError;
use crate::models::{normalize, ImageFormat, RawRenderRequest, RenderOptions, ReturnMode};
use crate::server::AppState;
use crate::services::cache_key::artifact_name;

/// POST body: inline SVG plus the shared render parameters.
#[derive(Debug, Deserialize)]
struct RenderBody {
    svg: Option<String>,
    #[serde(flatten)]
    raw: RawRenderRequest,
}

/// `GET /*target` - render an SVG fetched from the URL in the path.
pub async fn handle_get(
    State(state): State<AppState>,
    Path(target): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ServiceError> {
    let target = target.trim().to_string();
    if target.is_empty() {
        return Err(ServiceError::MissingSvgUrl);
    }
    if Url::parse(&target).is_err() {
        tracing::warn!(target = %target, "Failed to parse SVG URL");
        return Err(ServiceError::InvalidSvgUrl);
    }

    let raw = RawRenderRequest::from_query(&params, &state.config)?;
    let options = normalize(&raw, &state.config)?;

    let svg = state.fetcher.fetch(&target).await?;

    respond(&state, &svg, &options).await
}

/// `GET /` - no target URL in the path.
pub async fn handle_get_root() -> Result<Response, ServiceError> {
    Err(ServiceError::MissingSvgUrl)
}

/// `POST /` - render inline SVG content.
pub async fn handle_post(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let body: RenderBody =
        serde_json::from_slice(&body).map_err(|_| ServiceError::InvalidJson)?;

    let svg = match body.svg {
        Some(svg) if !svg.is_empty() => svg,
        _ => return Err(ServiceError::MissingSvgContent),
    };

    if svg.len() > state.config.max_svg_size {
        return Err(ServiceError::SvgTooLarge {
            max: state.config.max_svg_size,
        });
    }

    let options = normalize(&body.raw, &state.config)?;

    respond(&state, &svg, &options).await
}

/// CORS preflight: 204 with the allowed methods and headers, no body.
pub async fn handle_preflight() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );

    (StatusCode::NO_CONTENT, headers).into_response()
}

/// Fallback for unsupported methods on known routes.
pub async fn handle_method_not_allowed() -> ServiceError {
    ServiceError::MethodNotAllowed
}

/// Render and deliver according to the return mode.
///
/// In URL mode the stored artifact is looked up first, so a cache hit
/// skips rendering entirely.
async fn respond(
    state: &AppState,
    svg: &str,
    options: &RenderOptions,
) -> Result<Response, ServiceError> {
    match options.return_mode {
        ReturnMode::Binary => {
            let bytes = state.pipeline.render(svg, options).await?;
            Ok(binary_response(bytes, options.format))
        }
        ReturnMode::Url => {
            let name = artifact_name(svg, options);

            if let Some(url) = state
                .storage
                .try_reuse(&name, options.url_expiry_secs)
                .await?
            {
                tracing::info!(name = %name, "Serving cached artifact");
                return Ok(url_response(&url, options.url_expiry_secs));
            }

            let bytes = state.pipeline.render(svg, options).await?;
            let url = state
                .storage
                .store(&name, &bytes, options.format.content_type(), options.url_expiry_secs)
                .await?;
            Ok(url_response(&url, options.url_expiry_secs))
        }
    }
}

fn binary_response(bytes: Vec<u8>, format: ImageFormat) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=86400"),
    );

    (headers, bytes).into_response()
}

fn url_response(url: &str, expires_in_secs: u64) -> Response {
    let expires_at = chrono::Utc::now() + chrono::Duration::seconds(expires_in_secs as i64);

    let body = Json(json!({
        "success": true,
        "data": {
            "url": url,
            "expires_at": expires_at.to_rfc3339(),
            "expires_in": expires_in_secs,
        },
    }));

    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    (headers, body).into_response()
}
