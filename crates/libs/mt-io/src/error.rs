//! Tool error types.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error("Tool not available: {0}")]
    ToolMissing(String),

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    #[error("{tool} produced no output file")]
    NoOutput { tool: String },
}
