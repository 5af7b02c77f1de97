//! Object storage cache for rendered artifacts.
//!
//! Artifacts are stored under their content-addressed name; an existing
//! object is signed fresh instead of re-uploaded, and uploads always allow
//! overwrite so concurrent requests computing the same key resolve by
//! idempotent overwrite rather than locking.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::error::ServiceError;
use crate::models::AppConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage request failed: {0}")]
    Request(String),

    #[error("unexpected storage response: {0}")]
    Response(String),
}

/// Minimal object-store surface the cache needs: existence check, upsert
/// upload, and signed URL issuance.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
        cache_control_secs: u64,
    ) -> Result<(), StoreError>;

    /// Issue a time-limited retrieval URL, independent of object retention.
    async fn signed_url(&self, name: &str, expires_in_secs: u64) -> Result<String, StoreError>;
}

/// Supabase Storage REST client.
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, anon_key: &str, bucket: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for SupabaseStore {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.anon_key)
            .json(&json!({ "prefix": "", "search": name }))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Response(format!(
                "list returned {}",
                response.status()
            )));
        }

        let objects: Vec<ListedObject> = response
            .json()
            .await
            .map_err(|e| StoreError::Response(e.to_string()))?;

        Ok(objects.iter().any(|o| o.name == name))
    }

    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
        cache_control_secs: u64,
    ) -> Result<(), StoreError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, name
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.anon_key)
            .header("content-type", content_type)
            .header("cache-control", format!("max-age={cache_control_secs}"))
            // Overwrite-allowed: concurrent requests with the same key race
            // to an identical artifact
            .header("x-upsert", "true")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Response(format!(
                "upload returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn signed_url(&self, name: &str, expires_in_secs: u64) -> Result<String, StoreError> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, self.bucket, name
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.anon_key)
            .json(&json!({ "expiresIn": expires_in_secs }))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Response(format!(
                "sign returned {}",
                response.status()
            )));
        }

        let signed: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Response(e.to_string()))?;

        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }
}

/// Cache layer over the object store.
pub struct StorageCache {
    store: Option<std::sync::Arc<dyn ObjectStore>>,
}

impl StorageCache {
    /// Build from configuration. Missing storage settings produce a cache
    /// that reports the configuration error on first use, not at startup.
    pub fn from_config(config: &AppConfig) -> Self {
        let store: Option<std::sync::Arc<dyn ObjectStore>> = if config.storage_configured() {
            Some(std::sync::Arc::new(SupabaseStore::new(
                &config.supabase_url,
                &config.supabase_anon_key,
                &config.supabase_storage_bucket,
            )))
        } else {
            None
        };

        Self { store }
    }

    pub fn with_store(store: std::sync::Arc<dyn ObjectStore>) -> Self {
        Self { store: Some(store) }
    }

    fn backend(&self) -> Result<&dyn ObjectStore, ServiceError> {
        self.store
            .as_deref()
            .ok_or_else(|| ServiceError::StorageConfig("storage configuration missing".to_string()))
    }

    /// Return a fresh signed URL for an already-stored artifact, if one
    /// exists under this name. This is the caching benefit: no re-render,
    /// no re-upload.
    pub async fn try_reuse(
        &self,
        name: &str,
        expires_in_secs: u64,
    ) -> Result<Option<String>, ServiceError> {
        let store = self.backend()?;

        if !store
            .exists(name)
            .await
            .map_err(|e| ServiceError::StorageUpload(e.to_string()))?
        {
            return Ok(None);
        }

        tracing::debug!(name, "Reusing stored artifact");
        let url = store
            .signed_url(name, expires_in_secs)
            .await
            .map_err(|e| ServiceError::StorageUpload(e.to_string()))?;
        Ok(Some(url))
    }

    /// Upload a new artifact and sign it.
    pub async fn store(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
        expires_in_secs: u64,
    ) -> Result<String, ServiceError> {
        let store = self.backend()?;

        store
            .upload(name, bytes, content_type, expires_in_secs)
            .await
            .map_err(|e| ServiceError::StorageUpload(e.to_string()))?;

        tracing::debug!(name, bytes = bytes.len(), "Stored artifact");
        store
            .signed_url(name, expires_in_secs)
            .await
            .map_err(|e| ServiceError::StorageUpload(e.to_string()))
    }
}
