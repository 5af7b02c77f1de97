//! Render option normalization.
//!
//! Caller-supplied parameters (query string or JSON body) are merged over
//! configured defaults and range-checked into an immutable [`RenderOptions`]
//! value. Normalization is the only producer of `RenderOptions`, so the
//! pipeline can rely on every field being in range.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::error::ServiceError;
use crate::models::AppConfig;

/// Output format of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    /// Alternate spelling of JPEG, kept so cache keys distinguish the two
    Jpg,
    Jpeg,
    Webp,
    Pdf,
}

impl ImageFormat {
    /// Parse a format name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Pdf => "pdf",
        }
    }

    /// File extension used for stored artifacts.
    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Pdf => "application/pdf",
        }
    }

    /// Quality is only meaningful for lossy encoders.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpg | Self::Jpeg | Self::Webp)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the rendered bytes are returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnMode {
    /// Bytes in the response body
    Binary,
    /// Uploaded to object storage, signed URL in a JSON response
    Url,
}

impl ReturnMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "binary" => Some(Self::Binary),
            "url" => Some(Self::Url),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Url => "url",
        }
    }
}

/// Untyped caller input, shared by the GET query string and the POST body.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawRenderRequest {
    pub format: Option<String>,
    pub scale: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    pub background_color: Option<String>,
    #[serde(rename = "waitFor")]
    pub wait_for: Option<u64>,
    pub return_type: Option<String>,
    pub url_expiry: Option<u64>,
}

impl RawRenderRequest {
    /// Build a raw request from GET query parameters.
    ///
    /// Each numeric parameter that fails to parse yields that field's own
    /// validation error rather than a generic one. An unparseable
    /// `url_expiry` falls back to the configured default.
    pub fn from_query(
        params: &HashMap<String, String>,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let mut raw = Self::default();

        if let Some(scale) = params.get("scale") {
            raw.scale = Some(scale.parse().map_err(|_| ServiceError::InvalidScale)?);
        }
        if let Some(width) = params.get("width") {
            raw.width = Some(width.parse().map_err(|_| ServiceError::InvalidWidth {
                max: config.max_width,
            })?);
        }
        if let Some(height) = params.get("height") {
            raw.height = Some(height.parse().map_err(|_| ServiceError::InvalidHeight {
                max: config.max_height,
            })?);
        }
        if let Some(quality) = params.get("quality") {
            raw.quality = Some(quality.parse().map_err(|_| ServiceError::InvalidQuality)?);
        }
        if let Some(expiry) = params.get("url_expiry") {
            match expiry.parse() {
                Ok(expiry) => raw.url_expiry = Some(expiry),
                Err(_) => {
                    tracing::warn!(url_expiry = %expiry, "Ignoring unparseable url_expiry");
                }
            }
        }
        raw.format = params.get("format").cloned();
        raw.background_color = params.get("background_color").cloned();
        raw.return_type = params.get("return_type").cloned();

        Ok(raw)
    }
}

/// Fully-populated, validated render parameters.
///
/// Immutable once produced; the pipeline and cache key derivation both
/// consume it as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub format: ImageFormat,
    pub scale: f64,
    /// Caller-requested width in pixels, pre-scale
    pub width: Option<u32>,
    /// Caller-requested height in pixels, pre-scale
    pub height: Option<u32>,
    pub quality: u8,
    pub background_color: String,
    /// Post-load settling wait in milliseconds
    pub wait_for_ms: u64,
    pub return_mode: ReturnMode,
    pub url_expiry_secs: u64,
}

/// Merge caller parameters over configured defaults and validate.
///
/// Validation order: scale, width, height, quality, format, return type.
/// Pure function; normalizing the fields of an already-normalized value
/// yields an identical value.
pub fn normalize(raw: &RawRenderRequest, config: &AppConfig) -> Result<RenderOptions, ServiceError> {
    let scale = raw.scale.unwrap_or(config.default_scale);
    let quality = raw.quality.unwrap_or(u32::from(config.default_quality));

    if !(scale > 0.0 && scale <= 10.0) {
        return Err(ServiceError::InvalidScale);
    }

    if let Some(width) = raw.width {
        if width == 0 || width > config.max_width {
            return Err(ServiceError::InvalidWidth {
                max: config.max_width,
            });
        }
    }

    if let Some(height) = raw.height {
        if height == 0 || height > config.max_height {
            return Err(ServiceError::InvalidHeight {
                max: config.max_height,
            });
        }
    }

    if !(1..=100).contains(&quality) {
        return Err(ServiceError::InvalidQuality);
    }

    let format_name = raw.format.as_deref().unwrap_or(&config.default_format);
    let format = ImageFormat::parse(format_name).ok_or_else(|| ServiceError::UnsupportedFormat {
        format: format_name.to_string(),
    })?;

    let return_name = raw
        .return_type
        .as_deref()
        .unwrap_or(&config.default_return_type);
    let return_mode =
        ReturnMode::parse(return_name).ok_or_else(|| ServiceError::InvalidReturnType {
            value: return_name.to_string(),
        })?;

    Ok(RenderOptions {
        format,
        scale,
        width: raw.width,
        height: raw.height,
        quality: quality as u8,
        background_color: raw
            .background_color
            .clone()
            .unwrap_or_else(|| config.default_background_color.clone()),
        wait_for_ms: raw.wait_for.unwrap_or(config.default_wait_for),
        return_mode,
        url_expiry_secs: raw.url_expiry.unwrap_or(config.default_url_expiry),
    })
}
