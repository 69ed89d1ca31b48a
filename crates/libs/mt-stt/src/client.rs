//! Speech recognition REST client.

use std::time::Duration;

use tracing::debug;

use crate::api::{Operation, RecognitionAudio, RecognitionConfig, RecognizeRequest, RecognizeResponse};
use crate::prelude::*;

pub const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com/v1p1beta1";

/// How often a long-running operation is polled.
const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Give up on an operation after this long.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(3600);

/// Thin client over the speech REST endpoints, authenticated with an API key.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    api_key: String,
    base: String,
}

impl SpeechClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Synchronous recognition of inline audio (roughly up to a minute).
    pub async fn recognize(
        &self,
        config: RecognitionConfig,
        audio: RecognitionAudio,
    ) -> Result<RecognizeResponse> {
        let url = format!("{}/speech:recognize?key={}", self.base, self.api_key);
        let response = self
            .http
            .post(url)
            .json(&RecognizeRequest { config, audio })
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Starts a long-running recognition of bucket-hosted audio and polls the
    /// operation until it finishes.
    pub async fn long_running_recognize(
        &self,
        config: RecognitionConfig,
        audio: RecognitionAudio,
    ) -> Result<RecognizeResponse> {
        let url = format!("{}/speech:longrunningrecognize?key={}", self.base, self.api_key);
        let response = self
            .http
            .post(url)
            .json(&RecognizeRequest { config, audio })
            .send()
            .await?;
        let operation: Operation = Self::read_json(response).await?;
        debug!("long-running recognition started: {}", operation.name);
        self.wait_for_operation(&operation.name).await
    }

    async fn wait_for_operation(&self, name: &str) -> Result<RecognizeResponse> {
        let deadline = tokio::time::Instant::now() + OPERATION_TIMEOUT;
        loop {
            let url = format!("{}/operations/{}?key={}", self.base, name, self.api_key);
            let response = self.http.get(url).send().await?;
            let operation: Operation = Self::read_json(response).await?;
            if operation.done {
                if let Some(error) = operation.error {
                    return Err(Error::OperationFailed(error.message));
                }
                return Ok(operation.response.unwrap_or_default());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::OperationTimeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Deserializes a response, mapping non-2xx statuses to [`Error::Api`]
    /// with the service's own message when it sent one.
    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<crate::api::ApiErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .map(|detail| detail.message)
                .unwrap_or(body);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
