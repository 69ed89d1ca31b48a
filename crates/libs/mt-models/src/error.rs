//! Store error types.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid entry id")]
    InvalidEntryId,

    #[error("Invalid file name")]
    InvalidFileName,

    #[error("Entry not found")]
    EntryNotFound,
}
