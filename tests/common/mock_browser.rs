//! Scripted rendering backend for integration tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use svgsnap::models::ImageFormat;
use svgsnap::services::{
    BrowserConnector, BrowserSession, ElementSize, RenderSurface, SessionError,
};

/// PNG file signature, so binary responses can be sniffed in assertions.
pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Default)]
struct Recorders {
    connects: AtomicUsize,
    captures: AtomicUsize,
    last_endpoint: Mutex<Option<String>>,
    last_viewport: Mutex<Option<(u32, u32)>>,
}

/// Connector that fabricates deterministic bytes instead of talking to a
/// real browser, recording how it was driven.
#[derive(Default)]
pub struct MockConnector {
    recorders: Arc<Recorders>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connect_count(&self) -> usize {
        self.recorders.connects.load(Ordering::SeqCst)
    }

    pub fn capture_count(&self) -> usize {
        self.recorders.captures.load(Ordering::SeqCst)
    }

    pub fn last_endpoint(&self) -> Option<String> {
        self.recorders.last_endpoint.lock().unwrap().clone()
    }

    pub fn last_viewport(&self) -> Option<(u32, u32)> {
        *self.recorders.last_viewport.lock().unwrap()
    }
}

#[async_trait]
impl BrowserConnector for MockConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn BrowserSession>, SessionError> {
        self.recorders.connects.fetch_add(1, Ordering::SeqCst);
        *self.recorders.last_endpoint.lock().unwrap() = Some(endpoint.to_string());
        Ok(Box::new(MockSession {
            recorders: self.recorders.clone(),
        }))
    }
}

struct MockSession {
    recorders: Arc<Recorders>,
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn open_surface(&self) -> Result<Box<dyn RenderSurface>, SessionError> {
        Ok(Box::new(MockSurface {
            recorders: self.recorders.clone(),
        }))
    }

    async fn close(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

struct MockSurface {
    recorders: Arc<Recorders>,
}

#[async_trait]
impl RenderSurface for MockSurface {
    async fn set_content(&self, _html: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn measure_svg(&self) -> Result<ElementSize, SessionError> {
        Ok(ElementSize {
            width: 800.0,
            height: 600.0,
        })
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), SessionError> {
        *self.recorders.last_viewport.lock().unwrap() = Some((width, height));
        Ok(())
    }

    async fn capture_image(
        &self,
        format: ImageFormat,
        _quality: Option<u8>,
    ) -> Result<Vec<u8>, SessionError> {
        self.recorders.captures.fetch_add(1, Ordering::SeqCst);
        let mut bytes = match format {
            ImageFormat::Png => PNG_MAGIC.to_vec(),
            _ => vec![0xFF, 0xD8],
        };
        bytes.extend_from_slice(b"mock-image");
        Ok(bytes)
    }

    async fn capture_pdf(&self, _scale: f64) -> Result<Vec<u8>, SessionError> {
        self.recorders.captures.fetch_add(1, Ordering::SeqCst);
        Ok(b"%PDF-1.4 mock".to_vec())
    }
}
