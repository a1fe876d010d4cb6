use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

use crate::client::{authorize, send};
use crate::{RemoteError, RemoteSettings};

/// Bucket storage for uploaded statements.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), RemoteError>;

    /// Publicly resolvable URL for an object stored under `key`.
    fn public_url(&self, key: &str) -> Result<String, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestObjectStore {
    client: reqwest::Client,
    settings: Arc<RemoteSettings>,
}

impl ReqwestObjectStore {
    pub fn new(client: reqwest::Client, settings: Arc<RemoteSettings>) -> Self {
        Self { client, settings }
    }
}

#[async_trait::async_trait]
impl ObjectStore for ReqwestObjectStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), RemoteError> {
        let url = self
            .settings
            .endpoint(&["storage", "v1", "object", self.settings.bucket.as_str(), key])?;
        let request = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        send(authorize(request, &self.settings.api_key)).await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<String, RemoteError> {
        let url = self.settings.endpoint(&[
            "storage",
            "v1",
            "object",
            "public",
            self.settings.bucket.as_str(),
            key,
        ])?;
        Ok(url.to_string())
    }
}
