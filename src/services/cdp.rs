//! CDP-backed implementation of the rendering session traits.
//!
//! Connects to a browserless-style service over its WebSocket endpoint and
//! drives pages through chromiumoxide. This is the only module that knows
//! the wire protocol; everything above it talks to the traits in
//! [`crate::services::session`].

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::models::ImageFormat;
use crate::services::session::{
    BrowserConnector, BrowserSession, ElementSize, RenderSurface, SessionError,
};

// A4 paper size in inches
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.7;

/// Reads the post-scale bounding box of the SVG element. Returned as a
/// JSON string because only by-value results survive the protocol.
const MEASURE_SVG_JS: &str = r#"
JSON.stringify((() => {
  const svg = document.querySelector('svg');
  if (!svg) return { width: 0, height: 0 };

  const rect = svg.getBoundingClientRect();
  return {
    width: rect.width || svg.clientWidth || 800,
    height: rect.height || svg.clientHeight || 600
  };
})())
"#;

fn remote(e: impl ToString) -> SessionError {
    SessionError::Remote(e.to_string())
}

/// Connector that opens CDP sessions over WebSocket.
pub struct CdpConnector;

#[async_trait]
impl BrowserConnector for CdpConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn BrowserSession>, SessionError> {
        let (browser, mut handler) = Browser::connect(endpoint)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        // The handler must be polled for the connection to make progress
        let driver = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Box::new(CdpSession {
            browser: Mutex::new(Some(browser)),
            driver,
        }))
    }
}

struct CdpSession {
    browser: Mutex<Option<Browser>>,
    driver: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for CdpSession {
    async fn open_surface(&self) -> Result<Box<dyn RenderSurface>, SessionError> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| remote("session already closed"))?;

        let page = browser.new_page("about:blank").await.map_err(remote)?;
        Ok(Box::new(CdpSurface { page }))
    }

    async fn close(&self) -> Result<(), SessionError> {
        let mut guard = self.browser.lock().await;
        let result = match guard.take() {
            Some(mut browser) => browser.close().await.map(|_| ()).map_err(remote),
            None => Ok(()),
        };
        self.driver.abort();
        result
    }
}

struct CdpSurface {
    page: Page,
}

#[async_trait]
impl RenderSurface for CdpSurface {
    async fn set_content(&self, html: &str) -> Result<(), SessionError> {
        self.page.set_content(html).await.map(|_| ()).map_err(remote)
    }

    async fn measure_svg(&self) -> Result<ElementSize, SessionError> {
        let json: String = self
            .page
            .evaluate(MEASURE_SVG_JS)
            .await
            .map_err(remote)?
            .into_value()
            .map_err(remote)?;

        serde_json::from_str(&json).map_err(remote)
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), SessionError> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            // Scaling is handled by dimension computation, never compounded
            // with a device pixel ratio
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(SessionError::Remote)?;

        self.page.execute(params).await.map(|_| ()).map_err(remote)
    }

    async fn capture_image(
        &self,
        format: ImageFormat,
        quality: Option<u8>,
    ) -> Result<Vec<u8>, SessionError> {
        let cdp_format = match format {
            ImageFormat::Png => CaptureScreenshotFormat::Png,
            ImageFormat::Jpg | ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
            ImageFormat::Webp => CaptureScreenshotFormat::Webp,
            ImageFormat::Pdf => {
                return Err(remote("pdf cannot be captured as a screenshot"));
            }
        };

        // Exact viewport capture, never full-page growth
        let mut params = ScreenshotParams::builder()
            .format(cdp_format)
            .full_page(false);
        if let Some(quality) = quality {
            params = params.quality(i64::from(quality));
        }

        self.page.screenshot(params.build()).await.map_err(remote)
    }

    async fn capture_pdf(&self, scale: f64) -> Result<Vec<u8>, SessionError> {
        let params = PrintToPdfParams {
            print_background: Some(true),
            scale: Some(scale),
            paper_width: Some(A4_WIDTH_IN),
            paper_height: Some(A4_HEIGHT_IN),
            ..Default::default()
        };

        self.page.pdf(params).await.map_err(remote)
    }
}
