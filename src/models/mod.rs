pub mod config;
pub mod options;

pub use config::AppConfig;
pub use options::{normalize, ImageFormat, RawRenderRequest, RenderOptions, ReturnMode};
