use config::{Config, Environment};
use serde::Deserialize;

use crate::services::token_pool::PLACEHOLDER_TOKEN;

/// Application configuration, loaded from environment variables.
///
/// Every field has a default so the service starts with an empty
/// environment; `validate` reports the combinations that cannot work
/// (e.g. cloud rendering without a real token).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Use a self-hosted rendering endpoint instead of the cloud one
    #[serde(default)]
    pub use_self_hosted: bool,

    /// WebSocket endpoint of a self-hosted rendering service
    #[serde(default = "default_self_hosted_url")]
    pub browserless_self_hosted_url: String,

    /// WebSocket endpoint of the cloud rendering service
    #[serde(default = "default_cloud_url")]
    pub browserless_cloud_url: String,

    /// Comma-separated rendering service tokens
    #[serde(default = "default_token")]
    pub browserless_token: String,

    // Render defaults, applied when the caller omits a parameter
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_scale")]
    pub default_scale: f64,
    #[serde(default = "default_quality")]
    pub default_quality: u8,
    #[serde(default = "default_background_color")]
    pub default_background_color: String,
    /// Post-load settling wait in milliseconds
    #[serde(default = "default_wait_for")]
    pub default_wait_for: u64,
    #[serde(default = "default_return_type")]
    pub default_return_type: String,
    /// Signed URL lifetime in seconds (3 days)
    #[serde(default = "default_url_expiry")]
    pub default_url_expiry: u64,

    // Abuse limits
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,
    #[serde(default = "default_max_dimension")]
    pub max_height: u32,
    #[serde(default = "default_max_svg_size")]
    pub max_svg_size: usize,

    // Source domain policy
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default = "default_blocked_domains")]
    pub blocked_domains: Vec<String>,

    // Object storage (Supabase Storage compatible REST API)
    #[serde(default)]
    pub supabase_url: String,
    #[serde(default)]
    pub supabase_anon_key: String,
    #[serde(default = "default_bucket")]
    pub supabase_storage_bucket: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_self_hosted_url() -> String {
    "ws://localhost:3000".to_string()
}

fn default_cloud_url() -> String {
    "wss://production-sfo.browserless.io".to_string()
}

fn default_token() -> String {
    PLACEHOLDER_TOKEN.to_string()
}

fn default_format() -> String {
    "png".to_string()
}

fn default_scale() -> f64 {
    1.0
}

fn default_quality() -> u8 {
    90
}

fn default_background_color() -> String {
    "#ffffff".to_string()
}

fn default_wait_for() -> u64 {
    1000
}

fn default_return_type() -> String {
    "binary".to_string()
}

fn default_url_expiry() -> u64 {
    259_200
}

fn default_max_dimension() -> u32 {
    2048
}

fn default_max_svg_size() -> usize {
    1024 * 1024
}

fn default_blocked_domains() -> Vec<String> {
    ["localhost", "127.0.0.1", "0.0.0.0", "10.0.0.0", "192.168.0.0"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_bucket() -> String {
    "svg-images".to_string()
}

fn default_port() -> u16 {
    8000
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Domain lists (`ALLOWED_DOMAINS`, `BLOCKED_DOMAINS`) are
    /// comma-separated.
    pub fn load() -> Result<Self, config::ConfigError> {
        let source = Environment::default()
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("allowed_domains")
            .with_list_parse_key("blocked_domains");

        Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Resolve the rendering service endpoint for a credential.
    ///
    /// Self-hosted endpoints never carry a token; the cloud endpoint gets
    /// `?token=` appended unless the credential is still the placeholder.
    pub fn rendering_endpoint(&self, token: &str) -> String {
        if self.use_self_hosted {
            self.browserless_self_hosted_url.clone()
        } else if token.is_empty() || token == PLACEHOLDER_TOKEN {
            self.browserless_cloud_url.clone()
        } else {
            format!("{}?token={}", self.browserless_cloud_url, token)
        }
    }

    /// Check whether the object storage backend is configured.
    pub fn storage_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Collect startup problems. Empty means the configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !self.use_self_hosted {
            let has_real_token = self
                .browserless_token
                .split(',')
                .map(str::trim)
                .any(|t| !t.is_empty() && t != PLACEHOLDER_TOKEN);
            if !has_real_token {
                problems.push("cloud rendering requires a valid BROWSERLESS_TOKEN".to_string());
            }
        }

        if crate::models::options::ImageFormat::parse(&self.default_format).is_none() {
            problems.push(format!("unsupported default format: {}", self.default_format));
        }

        if !(self.default_scale > 0.0 && self.default_scale <= 10.0) {
            problems.push("default scale must be between 0 and 10".to_string());
        }

        if !(1..=100).contains(&self.default_quality) {
            problems.push("default quality must be between 1 and 100".to_string());
        }

        problems
    }

    /// Log a short summary of the effective configuration.
    pub fn log_summary(&self) {
        tracing::info!(
            mode = if self.use_self_hosted { "self-hosted" } else { "cloud" },
            default_format = %self.default_format,
            max_width = self.max_width,
            max_height = self.max_height,
            domain_allow_list = !self.allowed_domains.is_empty(),
            storage = self.storage_configured(),
            port = self.port,
            "Configuration loaded"
        );
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            use_self_hosted: false,
            browserless_self_hosted_url: default_self_hosted_url(),
            browserless_cloud_url: default_cloud_url(),
            browserless_token: default_token(),
            default_format: default_format(),
            default_scale: default_scale(),
            default_quality: default_quality(),
            default_background_color: default_background_color(),
            default_wait_for: default_wait_for(),
            default_return_type: default_return_type(),
            default_url_expiry: default_url_expiry(),
            max_width: default_max_dimension(),
            max_height: default_max_dimension(),
            max_svg_size: default_max_svg_size(),
            allowed_domains: Vec::new(),
            blocked_domains: default_blocked_domains(),
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_storage_bucket: default_bucket(),
            port: default_port(),
        }
    }
}
