//! Transcript types shared between the speech client and the stores.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::job::RecognitionParams;

/// One recognition hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAlternative {
    pub transcript: String,
    pub confidence: f64,
}

/// A recognized word with timing and optional speaker tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordInfo {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_tag: Option<i32>,
}

/// How a transcript was produced. Attached only when recognition yielded text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMeta {
    /// `sync` for inline audio, `bucket` for the long-running path.
    pub via: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub diarization_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diarization_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diarization_max: Option<u32>,
    pub model: String,
    pub use_enhanced: bool,
}

/// Full recognition output for one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub transcript: String,
    pub alternatives: Vec<TranscriptAlternative>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diarization_words: Vec<WordInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TranscriptMeta>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.transcript.trim().is_empty()
    }
}

/// The result file written to `results/transcription_<job_id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub job_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub created_at: i64,
    pub params: RecognitionParams,
    pub result: Transcript,
}
