use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the whole service.
///
/// Every failure that can reach the HTTP boundary is one of these variants,
/// each carrying a machine-readable code and an HTTP status. Anything
/// unexpected is coerced to `Internal` before a response is built so that
/// internal detail never leaks to the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("SVG URL is required")]
    MissingSvgUrl,

    #[error("Invalid SVG URL format")]
    InvalidSvgUrl,

    #[error("SVG content is required")]
    MissingSvgContent,

    #[error("SVG content too large (max {max} bytes)")]
    SvgTooLarge { max: usize },

    #[error("Invalid JSON body")]
    InvalidJson,

    #[error("Scale must be between 0 and 10")]
    InvalidScale,

    #[error("Width must be between 1 and {max}")]
    InvalidWidth { max: u32 },

    #[error("Height must be between 1 and {max}")]
    InvalidHeight { max: u32 },

    #[error("Quality must be between 1 and 100")]
    InvalidQuality,

    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Invalid return type: {value}")]
    InvalidReturnType { value: String },

    #[error("Access to this domain is blocked")]
    DomainBlocked,

    #[error("Access to this domain is not allowed")]
    DomainNotAllowed,

    #[error("Failed to fetch SVG: {status}")]
    FetchFailed { status: u16 },

    #[error("Content does not appear to be SVG")]
    InvalidSvgContent,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to fetch SVG: {0}")]
    FetchError(String),

    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    #[error("Failed to upload to storage: {0}")]
    StorageUpload(String),

    #[error("Storage configuration error: {0}")]
    StorageConfig(String),

    #[error("Internal server error")]
    Internal,
}

impl ServiceError {
    /// Machine-readable error code included in the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSvgUrl => "MISSING_SVG_URL",
            Self::InvalidSvgUrl => "INVALID_SVG_URL",
            Self::MissingSvgContent => "MISSING_SVG_CONTENT",
            Self::SvgTooLarge { .. } => "SVG_TOO_LARGE",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidScale => "INVALID_SCALE",
            Self::InvalidWidth { .. } => "INVALID_WIDTH",
            Self::InvalidHeight { .. } => "INVALID_HEIGHT",
            Self::InvalidQuality => "INVALID_QUALITY",
            Self::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Self::InvalidReturnType { .. } => "INVALID_RETURN_TYPE",
            Self::DomainBlocked => "DOMAIN_BLOCKED",
            Self::DomainNotAllowed => "DOMAIN_NOT_ALLOWED",
            Self::FetchFailed { .. } => "SVG_FETCH_FAILED",
            Self::InvalidSvgContent => "INVALID_SVG_CONTENT",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::FetchError(_) => "SVG_FETCH_ERROR",
            Self::RenderFailed(_) => "RENDER_ERROR",
            Self::StorageUpload(_) => "STORAGE_UPLOAD_FAILED",
            Self::StorageConfig(_) => "STORAGE_CONFIG_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingSvgUrl
            | Self::InvalidSvgUrl
            | Self::MissingSvgContent
            | Self::SvgTooLarge { .. }
            | Self::InvalidJson
            | Self::InvalidScale
            | Self::InvalidWidth { .. }
            | Self::InvalidHeight { .. }
            | Self::InvalidQuality
            | Self::UnsupportedFormat { .. }
            | Self::InvalidReturnType { .. } => StatusCode::BAD_REQUEST,
            Self::DomainBlocked | Self::DomainNotAllowed => StatusCode::FORBIDDEN,
            Self::FetchFailed { .. } => StatusCode::NOT_FOUND,
            Self::InvalidSvgContent => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::FetchError(_)
            | Self::RenderFailed(_)
            | Self::StorageUpload(_)
            | Self::StorageConfig(_)
            | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            },
        }));

        (self.status(), body).into_response()
    }
}
