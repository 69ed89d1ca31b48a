//! Error types for the Media Toolkit daemon.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::error::Error),

    #[error(transparent)]
    Models(#[from] mt_models::error::Error),

    #[error(transparent)]
    Stt(#[from] mt_stt::error::Error),

    #[error(transparent)]
    Content(#[from] mt_content::error::Error),

    #[error(transparent)]
    Web(#[from] mt_web::error::Error),

    #[error(transparent)]
    Tool(#[from] mt_io::error::Error),

    #[error("Transcription queue closed")]
    QueueClosed,

    /* Worker Errors */
    #[error("Download failed: {0}")]
    Download(String),

    #[error(
        "Empty transcription result. Possible causes: long audio in sync mode, unsupported codec, silence, or wrong language code."
    )]
    EmptyTranscript,

    /* Api Errors */
    #[error("Job not found")]
    JobNotFound,

    #[error("Prompt not found")]
    PromptNotFound,

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        error!("Creating API error response for error: {:?}", self);
        let (status, message) = match self {
            Error::Web(err) => return err.into_response(),
            Error::JobNotFound => (StatusCode::NOT_FOUND, "Job not found".to_string()),
            Error::PromptNotFound => (StatusCode::NOT_FOUND, "Prompt not found".to_string()),
            Error::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Error::Models(
                mt_models::error::Error::InvalidEntryId
                | mt_models::error::Error::InvalidFileName
                | mt_models::error::Error::EntryNotFound,
            ) => (StatusCode::NOT_FOUND, "File not found".to_string()),
            Error::Stt(mt_stt::error::Error::AudioNotFound(path)) => {
                (StatusCode::NOT_FOUND, format!("File not found: {path}"))
            }
            Error::Stt(
                mt_stt::error::Error::MissingApiKey | mt_stt::error::Error::MissingBucket,
            ) => (
                StatusCode::BAD_REQUEST,
                "Speech backend not configured".to_string(),
            ),
            Error::Content(
                mt_content::error::Error::LlmUnavailable
                | mt_content::error::Error::TtsUnavailable,
            ) => (
                StatusCode::BAD_REQUEST,
                "Content backend not configured".to_string(),
            ),
            Error::IO(_)
            | Error::Json(_)
            | Error::Models(_)
            | Error::Stt(_)
            | Error::Content(_)
            | Error::Tool(_)
            | Error::Download(_)
            | Error::EmptyTranscript
            | Error::QueueClosed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "status": status.as_u16()
            }
        }));
        (status, body).into_response()
    }
}
