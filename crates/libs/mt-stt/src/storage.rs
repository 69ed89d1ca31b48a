//! Object storage REST client used to stage audio for long-running
//! recognition.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::prelude::*;

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Report returned by the staging-bucket self test.
#[derive(Debug, Clone, Serialize)]
pub struct SelfTestReport {
    pub ok: bool,
    pub bucket: String,
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_blob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roundtrip_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bucket client, API-key authenticated like the speech client.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    api_key: String,
    bucket: String,
    prefix: String,
    base: String,
}

impl StorageClient {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            bucket: bucket.into(),
            prefix: prefix.into(),
            base: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_name(&self, basename: &str) -> String {
        format!("{}/{}_{}", self.prefix, Uuid::new_v4().simple(), basename)
    }

    /// Uploads a local file, returning its `gs://` URI.
    pub async fn upload_file(&self, path: &Path) -> Result<String> {
        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let object = self.object_name(&basename);
        let bytes = tokio::fs::read(path).await?;
        self.upload_bytes(&object, bytes, "application/octet-stream")
            .await?;
        info!("uploaded {} to gs://{}/{}", path.display(), self.bucket, object);
        Ok(format!("gs://{}/{}", self.bucket, object))
    }

    async fn upload_bytes(&self, object: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&key={}",
            self.base, self.bucket, self.api_key
        );
        let mut url = reqwest::Url::parse(&url).map_err(|err| Error::OperationFailed(err.to_string()))?;
        url.query_pairs_mut().append_pair("name", object);
        let response = self
            .http
            .post(url)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn object_url(&self, object: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base)
            .map_err(|err| Error::OperationFailed(err.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::OperationFailed("bad storage endpoint".to_string()))?;
            segments.extend(["storage", "v1", "b", &self.bucket, "o", object]);
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn stat(&self, object: &str) -> Result<()> {
        let response = self.http.get(self.object_url(object)?).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, object: &str) -> Result<()> {
        let response = self.http.delete(self.object_url(object)?).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Round-trips a tiny object: upload, stat, delete. Used by the
    /// diagnostics endpoint to verify bucket credentials.
    pub async fn self_test(&self) -> SelfTestReport {
        let started = Instant::now();
        let object = format!("{}/selftest_{}.txt", self.prefix, Uuid::new_v4().simple());
        let payload = format!("selftest {}", unix_now());

        let outcome = async {
            self.upload_bytes(&object, payload.into_bytes(), "text/plain")
                .await?;
            self.stat(&object).await?;
            self.delete(&object).await
        }
        .await;

        match outcome {
            Ok(()) => SelfTestReport {
                ok: true,
                bucket: self.bucket.clone(),
                prefix: self.prefix.clone(),
                test_blob: Some(format!("gs://{}/{}", self.bucket, object)),
                roundtrip_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Err(err) => SelfTestReport {
                ok: false,
                bucket: self.bucket.clone(),
                prefix: self.prefix.clone(),
                test_blob: None,
                roundtrip_ms: None,
                error: Some(err.to_string()),
            },
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
