//! Data model for the Media Toolkit.
//!
//! Jobs, transcripts and archive entries are plain serde types persisted as
//! JSON files; there is no database. The stores in [`store`] own the on-disk
//! layout and keep writes atomic so a crashed worker never leaves a
//! half-written state file behind.

pub mod archive;
pub mod error;
pub mod job;
pub mod prelude;
pub mod store;
pub mod transcript;
