//! Transcription job model.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the audio for a job comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobSource {
    /// A file already on the server (an upload or an operator-provided path).
    LocalFile { path: PathBuf },
    /// An object already in the speech bucket (`gs://...`).
    BucketUri { uri: String },
    /// A video page whose audio track is downloaded first.
    VideoUrl { url: String },
}

/// Recognition options accepted from the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionParams {
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diarization_speaker_count: Option<u32>,
    #[serde(default)]
    pub enable_word_time_offsets: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_enhanced: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_hints: Option<Vec<String>>,
}

fn default_language() -> String {
    "pl-PL".to_string()
}

impl RecognitionParams {
    /// Applies cross-field rules: speaker tags require word time offsets.
    pub fn normalized(mut self) -> Self {
        if self.language_code.trim().is_empty() {
            self.language_code = default_language();
        }
        if self.diarization_speaker_count.is_some() {
            self.enable_word_time_offsets = true;
        }
        self
    }
}

/// Lifecycle of a job. Status moves strictly forward; a finished job never
/// re-enters the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

/// A transcription job, persisted to `jobs/<id>.json` on every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub source: JobSource,
    pub params: RecognitionParams,
    pub status: JobStatus,
    /// Audio file resolved for the job (the upload, or the downloaded track).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
    /// Bucket object the audio was staged to, when the long-running path ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: i64,
}

impl Job {
    pub fn new(source: JobSource, params: RecognitionParams) -> Self {
        let audio_path = match &source {
            JobSource::LocalFile { path } => Some(path.clone()),
            _ => None,
        };
        Self {
            id: Uuid::new_v4(),
            source,
            params: params.normalized(),
            status: JobStatus::Queued,
            audio_path,
            bucket_uri: None,
            result_path: None,
            error: None,
            updated_at: Utc::now().timestamp(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now().timestamp();
    }
}

/// Name of the result file written for a finished job.
pub fn result_filename(job_id: &Uuid) -> String {
    format!("transcription_{}.json", job_id.simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diarization_forces_word_offsets() {
        let params = RecognitionParams {
            diarization_speaker_count: Some(3),
            ..Default::default()
        }
        .normalized();
        assert!(params.enable_word_time_offsets);

        let params = RecognitionParams::default().normalized();
        assert!(!params.enable_word_time_offsets);
        assert_eq!(params.language_code, "pl-PL");
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: RecognitionParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.language_code, "pl-PL");
        assert!(params.diarization_speaker_count.is_none());
    }

    #[test]
    fn new_job_resolves_local_audio() {
        let job = Job::new(
            JobSource::LocalFile {
                path: PathBuf::from("/tmp/in.wav"),
            },
            RecognitionParams::default(),
        );
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.audio_path, Some(PathBuf::from("/tmp/in.wav")));

        let job = Job::new(
            JobSource::VideoUrl {
                url: "https://youtu.be/abc".into(),
            },
            RecognitionParams::default(),
        );
        assert!(job.audio_path.is_none());
    }
}
