//! Content tooling error types.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No language model configured, set OPENAI_API_KEY")]
    LlmUnavailable,

    #[error("No speech synthesis configured, set GOOGLE_API_KEY")]
    TtsUnavailable,

    #[error("Text for synthesis must not be empty")]
    EmptyText,

    #[error("Model returned no completion")]
    EmptyCompletion,
}
