//! Speech client error types.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tool(#[from] mt_io::error::Error),

    #[error("Speech API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Missing GOOGLE_API_KEY")]
    MissingApiKey,

    #[error("No speech bucket configured")]
    MissingBucket,

    #[error("Recognition operation timed out")]
    OperationTimeout,

    #[error("Recognition operation failed: {0}")]
    OperationFailed(String),

    #[error("Audio file not found: {0}")]
    AudioNotFound(String),
}

impl Error {
    /// The API rejects inline audio that is too long with a 400 carrying this
    /// phrase; the caller retries through the bucket path.
    pub fn is_inline_duration_limit(&self) -> bool {
        matches!(self, Error::Api { message, .. }
            if message.to_lowercase().contains("inline audio exceeds duration limit"))
    }
}
