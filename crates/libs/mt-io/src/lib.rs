//! External tool integration.
//!
//! The transcription pipeline shells out to `ffmpeg` (normalize audio to the
//! format the speech API expects) and `yt-dlp` (pull the audio track of a
//! video page). [`runner`] is the generic process runner; [`tools`] are the
//! two concrete invocations.

pub mod error;
pub mod prelude;
pub mod runner;
pub mod tools;
