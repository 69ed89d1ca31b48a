//! Wire types for the speech REST API (v1p1beta1).

use mt_models::job::RecognitionParams;
use serde::{Deserialize, Serialize};

/// Languages the `video` model is available for. Diarization requests in one
/// of these pick the video model automatically.
pub const VIDEO_LANGS: &[&str] = &[
    "en-US", "en-GB", "en-AU", "fr-FR", "de-DE", "es-ES", "es-US", "it-IT", "pt-BR", "ja-JP",
    "ko-KR",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerDiarizationConfig {
    pub enable_speaker_diarization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_speaker_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speaker_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeechContext {
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate_hertz: Option<u32>,
    pub enable_automatic_punctuation: bool,
    pub enable_word_time_offsets: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diarization_config: Option<SpeakerDiarizationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub speech_contexts: Vec<SpeechContext>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub model: String,
    pub use_enhanced: bool,
}

/// Audio payload. Exactly one of `content` (base64) or `uri` is set.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionAudio {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecognizeRequest {
    pub config: RecognitionConfig,
    pub audio: RecognitionAudio,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInfoRest {
    #[serde(default)]
    pub word: String,
    /// Duration string like `"1.200s"`.
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub speaker_tag: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeRest {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub words: Vec<WordInfoRest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<AlternativeRest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecognizeResponse {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// A long-running recognition operation, polled until `done`.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<RecognizeResponse>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Effective model and enhancement for a request. Diarization without an
/// explicit model picks the video model where available.
pub fn effective_model(params: &RecognitionParams) -> (String, bool) {
    let mut model = params.model.clone().unwrap_or_default();
    let mut use_enhanced = params.use_enhanced.unwrap_or(false);
    if params.diarization_speaker_count.is_some()
        && params.model.is_none()
        && VIDEO_LANGS.contains(&params.language_code.as_str())
    {
        model = "video".to_string();
        use_enhanced = true;
    }
    (model, use_enhanced)
}

/// Builds the recognition config for `params`, overriding the language with
/// `language` (the fallback loop re-issues the same request per language).
pub fn build_config(params: &RecognitionParams, language: &str) -> RecognitionConfig {
    let diarization_config = params.diarization_speaker_count.map(|n| SpeakerDiarizationConfig {
        enable_speaker_diarization: true,
        min_speaker_count: Some(n.max(2)),
        max_speaker_count: Some(n),
    });
    let speech_contexts = params
        .additional_hints
        .as_ref()
        .filter(|hints| !hints.is_empty())
        .map(|hints| vec![SpeechContext { phrases: hints.clone() }])
        .unwrap_or_default();
    let (model, use_enhanced) = effective_model(params);

    RecognitionConfig {
        language_code: language.to_string(),
        encoding: None,
        sample_rate_hertz: None,
        enable_automatic_punctuation: true,
        enable_word_time_offsets: params.enable_word_time_offsets,
        diarization_config,
        speech_contexts,
        model,
        use_enhanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diarization_floors_min_speakers_at_two() {
        let params = RecognitionParams {
            language_code: "pl-PL".into(),
            diarization_speaker_count: Some(1),
            ..Default::default()
        }
        .normalized();
        let config = build_config(&params, "pl-PL");
        let diarization = config.diarization_config.unwrap();
        assert_eq!(diarization.min_speaker_count, Some(2));
        assert_eq!(diarization.max_speaker_count, Some(1));
        assert!(config.enable_word_time_offsets);
    }

    #[test]
    fn diarization_picks_video_model_for_english() {
        let params = RecognitionParams {
            language_code: "en-US".into(),
            diarization_speaker_count: Some(2),
            ..Default::default()
        };
        let (model, use_enhanced) = effective_model(&params);
        assert_eq!(model, "video");
        assert!(use_enhanced);

        let params = RecognitionParams {
            language_code: "pl-PL".into(),
            diarization_speaker_count: Some(2),
            ..Default::default()
        };
        let (model, use_enhanced) = effective_model(&params);
        assert!(model.is_empty());
        assert!(!use_enhanced);
    }

    #[test]
    fn explicit_model_is_kept() {
        let params = RecognitionParams {
            language_code: "en-US".into(),
            diarization_speaker_count: Some(2),
            model: Some("phone_call".into()),
            ..Default::default()
        };
        let (model, _) = effective_model(&params);
        assert_eq!(model, "phone_call");
    }

    #[test]
    fn config_serializes_camel_case_and_skips_empties() {
        let params = RecognitionParams {
            language_code: "pl-PL".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(build_config(&params, "pl-PL")).unwrap();
        assert_eq!(value["languageCode"], "pl-PL");
        assert_eq!(value["enableAutomaticPunctuation"], true);
        assert!(value.get("model").is_none());
        assert!(value.get("speechContexts").is_none());
        assert!(value.get("encoding").is_none());
    }
}
