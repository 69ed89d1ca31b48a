//! Speech-to-text integration.
//!
//! Talks to the cloud speech REST API (inline recognition for short audio,
//! bucket-staged long-running recognition for everything else) and to the
//! object storage REST API used for staging. The [`backend::SpeechBackend`]
//! trait is the seam the daemon's worker and routes are written against,
//! so tests can run without any network.

pub mod api;
pub mod backend;
pub mod client;
pub mod error;
pub mod extract;
pub mod prelude;
pub mod storage;

pub use backend::{GoogleSpeech, SpeechBackend};
