//! Media Toolkit daemon (mtd).
//!
//! Hosts the toolkit's REST API: session login, the audiototext pipeline
//! (uploads, video downloads, cloud recognition, stored results) and the
//! content panel (scraping, prompt application, the per-user archive).
//! The transcription worker runs alongside the API in the same process.

pub mod api;
pub mod audiototext;
pub mod content;
pub mod error;
pub mod prelude;
pub mod state;
pub mod worker;
