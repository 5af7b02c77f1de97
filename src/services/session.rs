//! Trait boundary to the remote rendering service.
//!
//! The pipeline never talks to a browser directly; it drives these traits.
//! Production wires in the CDP-backed implementation, tests substitute
//! scripted fakes. Releasing a session is only a request to the remote
//! side, not a proof that remote resources ended immediately.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::ImageFormat;

/// Failure from the remote rendering session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to rendering service: {0}")]
    Connect(String),

    #[error("{stage} timed out after {timeout_ms} ms")]
    Timeout {
        stage: &'static str,
        timeout_ms: u64,
    },

    #[error("rendering session error: {0}")]
    Remote(String),
}

impl SessionError {
    /// Whether this failure should mark the credential used for the
    /// attempt as failed. Matches connection, timeout, and protocol-level
    /// breakage; ordinary command errors do not condemn the credential.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Timeout { .. } => true,
            Self::Remote(message) => {
                message.contains("connect")
                    || message.contains("Target closed")
                    || message.contains("timeout")
                    || message.contains("Protocol error")
            }
        }
    }
}

/// Measured size of the rendered SVG element, in CSS pixels.
///
/// The measurement is taken from the live document after the scale
/// transform has been applied, so it needs no further scaling.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ElementSize {
    pub width: f64,
    pub height: f64,
}

/// Opens sessions against a rendering endpoint.
#[async_trait]
pub trait BrowserConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn BrowserSession>, SessionError>;
}

/// One live connection to the rendering service.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Allocate a rendering surface (a blank page).
    async fn open_surface(&self) -> Result<Box<dyn RenderSurface>, SessionError>;

    /// Release the session. Remote-side resources may outlive this call.
    async fn close(&self) -> Result<(), SessionError>;
}

/// A rendering surface holding one document.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Replace the surface's document with the given HTML.
    async fn set_content(&self, html: &str) -> Result<(), SessionError>;

    /// Measure the SVG element's post-scale bounding box.
    async fn measure_svg(&self) -> Result<ElementSize, SessionError>;

    /// Set the surface's pixel dimensions. Device scale factor is pinned
    /// to 1; scaling is handled entirely by dimension computation.
    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), SessionError>;

    /// Capture an exact-viewport image. Quality applies to lossy formats.
    async fn capture_image(
        &self,
        format: ImageFormat,
        quality: Option<u8>,
    ) -> Result<Vec<u8>, SessionError>;

    /// Print the document as a PDF (A4, background included).
    async fn capture_pdf(&self, scale: f64) -> Result<Vec<u8>, SessionError>;
}
