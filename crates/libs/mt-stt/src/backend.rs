//! The recognition seam the daemon is written against.

use std::future::Future;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use mt_config::config::SttConfig;
use mt_io::tools::{SPEECH_SAMPLE_RATE, convert_to_wav16, ffmpeg_available};
use mt_models::job::RecognitionParams;
use mt_models::transcript::{Transcript, TranscriptMeta};
use tracing::{info, warn};

use crate::api::{RecognitionAudio, build_config, effective_model};
use crate::client::SpeechClient;
use crate::extract::{attach_meta, extract_transcript};
use crate::prelude::*;
use crate::storage::{SelfTestReport, StorageClient};

/// Everything the worker and the routes need from a recognizer. Implemented
/// by [`GoogleSpeech`] in production and by fakes in tests.
pub trait SpeechBackend: Send + Sync + 'static {
    /// Transcribes a local audio file, choosing inline or bucket-staged
    /// recognition by size.
    fn transcribe_file(
        &self,
        path: &Path,
        params: &RecognitionParams,
    ) -> impl Future<Output = Result<Transcript>> + Send;

    /// Transcribes audio already staged in the bucket.
    fn transcribe_uri(
        &self,
        uri: &str,
        params: &RecognitionParams,
    ) -> impl Future<Output = Result<Transcript>> + Send;

    /// Stages a local file into the bucket, returning its URI.
    fn store_audio(&self, path: &Path) -> impl Future<Output = Result<String>> + Send;

    /// Round-trips a test object through the bucket.
    fn self_test(&self) -> impl Future<Output = SelfTestReport> + Send;
}

/// Production backend talking to the cloud speech and storage APIs.
#[derive(Debug)]
pub struct GoogleSpeech {
    speech: SpeechClient,
    storage: Option<StorageClient>,
    inline_max_bytes: u64,
    lang_fallbacks: Vec<String>,
}

impl GoogleSpeech {
    pub fn from_config(config: &SttConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or(Error::MissingApiKey)?;
        let http = reqwest::Client::new();
        let storage = config.bucket.clone().map(|bucket| {
            StorageClient::new(http.clone(), api_key.clone(), bucket, config.object_prefix.clone())
        });
        Ok(Self {
            speech: SpeechClient::new(http, api_key),
            storage,
            inline_max_bytes: config.inline_max_bytes,
            lang_fallbacks: config.lang_fallbacks.clone(),
        })
    }

    fn storage(&self) -> Result<&StorageClient> {
        self.storage.as_ref().ok_or(Error::MissingBucket)
    }

    /// The primary language followed by configured fallbacks, deduplicated.
    fn languages_for(&self, params: &RecognitionParams) -> Vec<String> {
        let mut languages = vec![params.language_code.clone()];
        for lang in &self.lang_fallbacks {
            if !languages.contains(lang) {
                languages.push(lang.clone());
            }
        }
        languages
    }

    fn meta_for(params: &RecognitionParams, via: &str, language: &str, uri: Option<&str>) -> TranscriptMeta {
        let (model, use_enhanced) = effective_model(params);
        TranscriptMeta {
            via: via.to_string(),
            language: language.to_string(),
            uri: uri.map(str::to_string),
            diarization_enabled: params.diarization_speaker_count.is_some(),
            diarization_min: params.diarization_speaker_count.map(|n| n.max(2)),
            diarization_max: params.diarization_speaker_count,
            model,
            use_enhanced,
        }
    }

    /// Stages `path` and runs long-running recognition on it. When the file
    /// has been re-encoded locally the encoding is pinned so the API does not
    /// mis-sniff it.
    async fn recognize_via_bucket(
        &self,
        path: &Path,
        params: &RecognitionParams,
        language: &str,
        force_linear16: bool,
    ) -> Result<Transcript> {
        let uri = self.storage()?.upload_file(path).await?;
        self.recognize_uri_with(&uri, params, language, force_linear16).await
    }

    async fn recognize_uri_with(
        &self,
        uri: &str,
        params: &RecognitionParams,
        language: &str,
        force_linear16: bool,
    ) -> Result<Transcript> {
        let mut config = build_config(params, language);
        if force_linear16 {
            config.encoding = Some("LINEAR16".to_string());
            config.sample_rate_hertz = Some(SPEECH_SAMPLE_RATE);
        }
        let audio = RecognitionAudio {
            content: None,
            uri: Some(uri.to_string()),
        };
        let response = self.speech.long_running_recognize(config, audio).await?;
        Ok(attach_meta(
            extract_transcript(&response),
            Self::meta_for(params, "gcs", language, Some(uri)),
        ))
    }

    /// Re-encodes to 16 kHz mono WAV when the encoder is installed; inline
    /// recognition is far more reliable on a known encoding. Returns `None`
    /// when the encoder is missing or fails, in which case the original file
    /// is sent as-is.
    async fn maybe_convert(path: &Path) -> Option<PathBuf> {
        if !ffmpeg_available() {
            return None;
        }
        let src = path.to_path_buf();
        let out_dir = std::env::temp_dir();
        match tokio::task::spawn_blocking(move || convert_to_wav16(&src, &out_dir)).await {
            Ok(Ok(converted)) => Some(converted),
            Ok(Err(err)) => {
                warn!("audio conversion failed, sending original: {err}");
                None
            }
            Err(err) => {
                warn!("audio conversion task failed: {err}");
                None
            }
        }
    }
}

impl SpeechBackend for GoogleSpeech {
    async fn transcribe_file(&self, path: &Path, params: &RecognitionParams) -> Result<Transcript> {
        if !path.is_file() {
            return Err(Error::AudioNotFound(path.display().to_string()));
        }
        let size = tokio::fs::metadata(path).await?.len();
        if size > self.inline_max_bytes {
            info!("audio is {size} bytes, staging through the bucket");
            return self.recognize_via_bucket(path, params, &params.language_code, false).await;
        }

        let converted = Self::maybe_convert(path).await;
        let inline_path = converted.as_deref().unwrap_or(path);
        let content = BASE64.encode(tokio::fs::read(inline_path).await?);

        let mut outcome = None;
        for language in self.languages_for(params) {
            let audio = RecognitionAudio {
                content: Some(content.clone()),
                uri: None,
            };
            match self.speech.recognize(build_config(params, &language), audio).await {
                Ok(response) => {
                    let transcript = attach_meta(
                        extract_transcript(&response),
                        Self::meta_for(params, "sync", &language, None),
                    );
                    if !transcript.is_empty() {
                        outcome = Some(Ok(transcript));
                        break;
                    }
                }
                Err(err) if err.is_inline_duration_limit() => {
                    info!("inline audio over the duration limit, staging through the bucket");
                    outcome = Some(
                        self.recognize_via_bucket(inline_path, params, &language, converted.is_some())
                            .await,
                    );
                    break;
                }
                Err(err) => {
                    outcome = Some(Err(err));
                    break;
                }
            }
        }

        if let Some(tmp) = converted {
            if let Err(err) = tokio::fs::remove_file(&tmp).await {
                warn!("could not remove converted audio {}: {err}", tmp.display());
            }
        }

        match outcome {
            Some(result) => result,
            // Every language came back empty inline; the bucket path handles
            // longer audio the sync endpoint silently truncates.
            None => {
                self.recognize_via_bucket(path, params, &params.language_code, false)
                    .await
            }
        }
    }

    async fn transcribe_uri(&self, uri: &str, params: &RecognitionParams) -> Result<Transcript> {
        self.recognize_uri_with(uri, params, &params.language_code, false).await
    }

    async fn store_audio(&self, path: &Path) -> Result<String> {
        self.storage()?.upload_file(path).await
    }

    async fn self_test(&self) -> SelfTestReport {
        match self.storage() {
            Ok(storage) => storage.self_test().await,
            Err(err) => SelfTestReport {
                ok: false,
                bucket: String::new(),
                prefix: String::new(),
                test_blob: None,
                roundtrip_ms: None,
                error: Some(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with_fallbacks(fallbacks: &[&str]) -> GoogleSpeech {
        GoogleSpeech::from_config(&SttConfig {
            api_key: Some("key".into()),
            bucket: Some("bucket".into()),
            object_prefix: "stt_uploads".into(),
            inline_max_bytes: 9_000_000,
            default_language: "pl-PL".into(),
            lang_fallbacks: fallbacks.iter().map(|lang| lang.to_string()).collect(),
        })
        .unwrap()
    }

    #[test]
    fn bucket_recognition_is_labelled_gcs() {
        let params = RecognitionParams {
            language_code: "pl-PL".into(),
            ..Default::default()
        };
        let meta = GoogleSpeech::meta_for(&params, "gcs", "pl-PL", Some("gs://b/o.wav"));
        assert_eq!(meta.via, "gcs");
        assert_eq!(meta.uri.as_deref(), Some("gs://b/o.wav"));
    }

    #[test]
    fn language_order_is_primary_then_fallbacks_deduped() {
        let backend = backend_with_fallbacks(&["en-US", "pl-PL", "de-DE"]);
        let params = RecognitionParams {
            language_code: "pl-PL".into(),
            ..Default::default()
        };
        assert_eq!(backend.languages_for(&params), vec!["pl-PL", "en-US", "de-DE"]);
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = GoogleSpeech::from_config(&SttConfig {
            api_key: None,
            bucket: None,
            object_prefix: "stt_uploads".into(),
            inline_max_bytes: 9_000_000,
            default_language: "pl-PL".into(),
            lang_fallbacks: Vec::new(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));
    }

    #[tokio::test]
    async fn missing_audio_is_reported_before_any_request() {
        let backend = backend_with_fallbacks(&[]);
        let err = backend
            .transcribe_file(Path::new("/nonexistent/clip.wav"), &RecognitionParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AudioNotFound(_)));
    }

    #[tokio::test]
    async fn self_test_without_bucket_reports_error() {
        let backend = GoogleSpeech::from_config(&SttConfig {
            api_key: Some("key".into()),
            bucket: None,
            object_prefix: "stt_uploads".into(),
            inline_max_bytes: 9_000_000,
            default_language: "pl-PL".into(),
            lang_fallbacks: Vec::new(),
        })
        .unwrap();
        let report = backend.self_test().await;
        assert!(!report.ok);
        assert!(report.error.is_some());
    }
}
