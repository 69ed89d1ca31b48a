//! Content panel tooling.
//!
//! Scrapes article pages into a title/text/media payload, runs editorial
//! prompts through a chat model, and synthesizes narration audio. The
//! [`service::ContentService`] ties the pieces together for the daemon's
//! routes.

pub mod error;
pub mod llm;
pub mod media;
pub mod prelude;
pub mod scrape;
pub mod service;
pub mod summarize;
pub mod tts;

pub use service::{ContentService, ScrapPayload};
