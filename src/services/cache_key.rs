//! Content-addressed cache keys for rendered artifacts.
//!
//! The key digests exactly the inputs that determine rendered output: the
//! SVG content plus the rendering-affecting options. Return mode and URL
//! expiry never participate, so the same artifact is reused across
//! different delivery choices.

use sha2::{Digest, Sha256};

use crate::models::RenderOptions;

/// Compute the cache key for a render.
///
/// SHA-256 over a canonical field sequence, truncated to 16 hex characters
/// for a filename-safe name.
pub fn cache_key(svg: &str, options: &RenderOptions) -> String {
    let mut hasher = Sha256::new();

    hasher.update(svg.as_bytes());
    hasher.update(b"|format:");
    hasher.update(options.format.as_str().as_bytes());
    hasher.update(b"|scale:");
    hasher.update(options.scale.to_string().as_bytes());
    hasher.update(b"|width:");
    match options.width {
        Some(width) => hasher.update(width.to_string().as_bytes()),
        None => hasher.update(b"-"),
    }
    hasher.update(b"|height:");
    match options.height {
        Some(height) => hasher.update(height.to_string().as_bytes()),
        None => hasher.update(b"-"),
    }
    hasher.update(b"|quality:");
    hasher.update(options.quality.to_string().as_bytes());
    hasher.update(b"|background:");
    hasher.update(options.background_color.as_bytes());
    hasher.update(b"|wait:");
    hasher.update(options.wait_for_ms.to_string().as_bytes());

    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Object name for a render: cache key plus format extension.
pub fn artifact_name(svg: &str, options: &RenderOptions) -> String {
    format!("{}.{}", cache_key(svg, options), options.format.extension())
}
