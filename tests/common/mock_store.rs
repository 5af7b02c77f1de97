//! In-memory object store for integration tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use svgsnap::services::{ObjectStore, StoreError};

#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
}

impl InMemoryStore {
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn object(&self, name: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.objects.lock().unwrap().contains_key(name))
    }

    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        _content_type: &str,
        _cache_control_secs: u64,
    ) -> Result<(), StoreError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn signed_url(&self, name: &str, expires_in_secs: u64) -> Result<String, StoreError> {
        Ok(format!(
            "https://storage.test/sign/{name}?expires={expires_in_secs}"
        ))
    }
}
