//! Concrete tool invocations for the transcription pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::prelude::*;
use crate::runner::Runner;

/// Sample rate the speech API is configured for.
pub const SPEECH_SAMPLE_RATE: u32 = 16_000;

/// Cookie configuration passed through to the downloader.
#[derive(Debug, Clone, Default)]
pub struct DownloadCookies {
    pub cookies_file: Option<PathBuf>,
    /// `browser` or `browser:profile`.
    pub from_browser: Option<String>,
}

/// Whether ffmpeg can be invoked at all.
pub fn ffmpeg_available() -> bool {
    Runner::new("ffmpeg", vec!["-version"])
        .run_captured()
        .map(|out| out.success())
        .unwrap_or(false)
}

/// Converts any audio file to 16 kHz mono PCM WAV.
pub fn convert_to_wav16(src: &Path, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let out = out_dir.join(format!("{}.16k.wav", Uuid::new_v4().simple()));
    let runner = Runner::new(
        "ffmpeg",
        vec![
            "-y".to_string(),
            "-i".to_string(),
            src.display().to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-ar".to_string(),
            SPEECH_SAMPLE_RATE.to_string(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            "-vn".to_string(),
            out.display().to_string(),
        ],
    );
    debug!("running {}", runner.get_full_command());
    let result = runner.run_captured()?;
    if !result.success() || !out.is_file() {
        return Err(Error::ToolFailed {
            tool: "ffmpeg".into(),
            detail: result.tail(500).to_string(),
        });
    }
    Ok(out)
}

/// Downloads the best audio track of a video page as WAV.
///
/// Each download gets a fresh subdirectory so the produced file can be found
/// without guessing which entry is new.
pub fn download_video_audio(
    url: &str,
    out_dir: &Path,
    cookies: &DownloadCookies,
) -> Result<PathBuf> {
    let dl_dir = out_dir.join(Uuid::new_v4().simple().to_string());
    fs::create_dir_all(&dl_dir)?;

    let mut args = vec![
        "-f".to_string(),
        "bestaudio".to_string(),
        "--no-playlist".to_string(),
        "-x".to_string(),
        "--audio-format".to_string(),
        "wav".to_string(),
        "-o".to_string(),
        format!("{}/%(id)s.%(ext)s", dl_dir.display()),
    ];
    if let Some(file) = &cookies.cookies_file {
        args.push("--cookies".to_string());
        args.push(file.display().to_string());
    } else if let Some(spec) = &cookies.from_browser {
        args.push("--cookies-from-browser".to_string());
        args.push(spec.clone());
    }
    args.push(url.to_string());

    let runner = Runner::new("yt-dlp", args);
    info!("downloading audio track: {url}");
    let result = runner.run_captured()?;
    if !result.success() {
        return Err(Error::ToolFailed {
            tool: "yt-dlp".into(),
            detail: result.tail(500).to_string(),
        });
    }

    for entry in fs::read_dir(&dl_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "wav") {
            return Ok(path);
        }
    }
    Err(Error::NoOutput {
        tool: "yt-dlp".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_downloader_or_bad_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = download_video_audio(
            "https://youtu.be/does-not-exist",
            dir.path(),
            &DownloadCookies::default(),
        );
        // Either the tool is absent or the download fails; both are errors.
        assert!(result.is_err());
    }
}
