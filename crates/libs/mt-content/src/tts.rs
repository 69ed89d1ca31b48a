//! Speech synthesis for archive narration.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1";

/// Rates outside this range are rejected by the API; clamp instead.
const MIN_SPEAKING_RATE: f32 = 0.5;
const MAX_SPEAKING_RATE: f32 = 2.0;

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'a str,
    speaking_rate: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// Text-to-speech client producing MP3 narration.
#[derive(Debug, Clone)]
pub struct TtsClient {
    http: reqwest::Client,
    api_key: String,
    voice: String,
    speaking_rate: f32,
    base: String,
}

impl TtsClient {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        voice: impl Into<String>,
        speaking_rate: f32,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            voice: voice.into(),
            speaking_rate,
            base: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// The `pl-PL` part of a voice name like `pl-PL-Wavenet-A`.
    fn language_code(&self) -> &str {
        self.voice.get(..5).unwrap_or(&self.voice)
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: self.language_code(),
                name: &self.voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: self
                    .speaking_rate
                    .clamp(MIN_SPEAKING_RATE, MAX_SPEAKING_RATE),
            },
        };

        let response = self
            .http
            .post(format!("{}/text:synthesize?key={}", self.base, self.api_key))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        let parsed: SynthesizeResponse = response.json().await?;
        Ok(BASE64.decode(parsed.audio_content)?)
    }
}
