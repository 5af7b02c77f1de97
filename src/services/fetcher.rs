//! SVG acquisition with source domain policy.

use url::Url;

use crate::error::ServiceError;
use crate::models::AppConfig;

/// Fetches SVG documents from caller-supplied URLs.
pub struct SvgFetcher {
    client: reqwest::Client,
    allowed_domains: Vec<String>,
    blocked_domains: Vec<String>,
}

impl SvgFetcher {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            allowed_domains: config.allowed_domains.clone(),
            blocked_domains: config.blocked_domains.clone(),
        }
    }

    /// Fetch SVG content from a URL, enforcing the domain policy.
    ///
    /// Content-type checking is lenient (many servers mislabel SVG), but
    /// the body must at least contain an `<svg` element.
    pub async fn fetch(&self, target: &str) -> Result<String, ServiceError> {
        let parsed = Url::parse(target).map_err(|_| ServiceError::InvalidSvgUrl)?;
        let hostname = parsed.host_str().unwrap_or_default().to_lowercase();

        self.check_domain(&hostname)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ServiceError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::FetchFailed {
                status: response.status().as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("svg") && !content_type.contains("xml") {
            tracing::warn!(
                content_type = %content_type,
                url = %target,
                "Unexpected content type, proceeding anyway"
            );
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::FetchError(e.to_string()))?;

        if !body.contains("<svg") {
            return Err(ServiceError::InvalidSvgContent);
        }

        Ok(body)
    }

    fn check_domain(&self, hostname: &str) -> Result<(), ServiceError> {
        if self
            .blocked_domains
            .iter()
            .any(|blocked| hostname.contains(blocked))
        {
            return Err(ServiceError::DomainBlocked);
        }

        if !self.allowed_domains.is_empty()
            && !self
                .allowed_domains
                .iter()
                .any(|allowed| hostname.ends_with(allowed))
        {
            return Err(ServiceError::DomainNotAllowed);
        }

        Ok(())
    }
}
