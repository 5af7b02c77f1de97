//! The render pipeline: one remote rendering session from connection to
//! captured bytes.
//!
//! Each request walks a linear sequence of stages, every remote stage
//! guarded by its own deadline: connect, open a surface, load the wrapped
//! document, wait for settling, resolve final pixel dimensions, configure
//! the viewport, capture. Session release always runs, whatever stage the
//! attempt died in. When the deadline fires first the underlying remote
//! operation is abandoned rather than cancelled, so remote resources may
//! keep running after the stage is declared failed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ServiceError;
use crate::models::{AppConfig, ImageFormat, RenderOptions};
use crate::services::session::{BrowserConnector, BrowserSession, RenderSurface, SessionError};
use crate::services::template::wrap_svg;
use crate::services::token_pool::TokenPool;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const SURFACE_TIMEOUT: Duration = Duration::from_secs(10);
const CONTENT_TIMEOUT: Duration = Duration::from_secs(10);
const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(20);
const PDF_TIMEOUT: Duration = Duration::from_secs(30);

/// Race an operation against a deadline.
///
/// On timeout the losing future is dropped on this side only; the remote
/// operation it represents is abandoned, not cancelled.
async fn deadline<T, F>(
    timeout: Duration,
    stage: &'static str,
    operation: F,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::Timeout {
            stage,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Drives rendering sessions against the remote service.
pub struct RenderPipeline {
    connector: Arc<dyn BrowserConnector>,
    tokens: Arc<TokenPool>,
    config: Arc<AppConfig>,
}

impl RenderPipeline {
    pub fn new(
        connector: Arc<dyn BrowserConnector>,
        tokens: Arc<TokenPool>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            connector,
            tokens,
            config,
        }
    }

    /// Render SVG content to image or PDF bytes.
    ///
    /// Consumes one credential from the pool for the attempt and reports
    /// connection-level failures back to it before the error surfaces as a
    /// render failure.
    pub async fn render(
        &self,
        svg: &str,
        options: &RenderOptions,
    ) -> Result<Vec<u8>, ServiceError> {
        let credential = self.tokens.available();
        let endpoint = self.config.rendering_endpoint(credential.as_str());

        tracing::debug!(
            token = %credential.redacted(),
            format = %options.format,
            scale = options.scale,
            "Starting render attempt"
        );

        let result = self.drive(&endpoint, svg, options).await;

        match result {
            Ok(bytes) => {
                tracing::info!(
                    format = %options.format,
                    bytes = bytes.len(),
                    "Render completed"
                );
                Ok(bytes)
            }
            Err(e) => {
                if e.is_connection_failure() {
                    self.tokens.mark_failed(&credential);
                }
                tracing::error!(error = %e, "Render attempt failed");
                Err(ServiceError::RenderFailed(e.to_string()))
            }
        }
    }

    /// Run one session: connect, capture, and always release.
    async fn drive(
        &self,
        endpoint: &str,
        svg: &str,
        options: &RenderOptions,
    ) -> Result<Vec<u8>, SessionError> {
        let session = deadline(
            CONNECT_TIMEOUT,
            "browser connect",
            self.connector.connect(endpoint),
        )
        .await?;

        let result = self.capture(session.as_ref(), svg, options).await;

        // Release failure must never mask the pipeline's actual result
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to close rendering session");
        }

        result
    }

    async fn capture(
        &self,
        session: &dyn BrowserSession,
        svg: &str,
        options: &RenderOptions,
    ) -> Result<Vec<u8>, SessionError> {
        let surface = deadline(SURFACE_TIMEOUT, "surface open", session.open_surface()).await?;

        let html = wrap_svg(svg, &options.background_color, options.scale);
        deadline(CONTENT_TIMEOUT, "content load", surface.set_content(&html)).await?;

        // Settling wait for async content (fonts etc.); a scheduled delay,
        // not a deadline-guarded stage
        tokio::time::sleep(Duration::from_millis(options.wait_for_ms)).await;

        let (width, height) = resolve_dimensions(surface.as_ref(), options).await?;
        surface.set_viewport(width, height).await?;

        if options.format == ImageFormat::Pdf {
            deadline(PDF_TIMEOUT, "pdf capture", surface.capture_pdf(options.scale)).await
        } else {
            let quality = options.format.is_lossy().then_some(options.quality);
            deadline(
                SCREENSHOT_TIMEOUT,
                "screenshot",
                surface.capture_image(options.format, quality),
            )
            .await
        }
    }
}

/// Compute the final viewport dimensions in pixels.
///
/// When both dimensions are caller-supplied they are raw pre-scale values
/// and get multiplied by the scale factor, because the CSS transform was
/// applied to the SVG element rather than to the requested output size.
/// Otherwise the live bounding box is measured; that measurement already
/// reflects the scale transform and is used as-is, with any single
/// caller-supplied dimension kept verbatim.
async fn resolve_dimensions(
    surface: &dyn RenderSurface,
    options: &RenderOptions,
) -> Result<(u32, u32), SessionError> {
    if let (Some(width), Some(height)) = (options.width, options.height) {
        let width = (f64::from(width) * options.scale).round() as u32;
        let height = (f64::from(height) * options.scale).round() as u32;
        tracing::debug!(width, height, scale = options.scale, "Using caller dimensions");
        return Ok((width, height));
    }

    let measured = surface.measure_svg().await?;
    let width = options
        .width
        .unwrap_or_else(|| measured.width.round() as u32);
    let height = options
        .height
        .unwrap_or_else(|| measured.height.round() as u32);
    tracing::debug!(
        measured_width = measured.width,
        measured_height = measured.height,
        width,
        height,
        "Using measured dimensions"
    );
    Ok((width, height))
}
