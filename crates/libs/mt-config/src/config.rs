//! Service settings assembled from the environment.

use std::path::PathBuf;
use std::str::FromStr;

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public path prefix when the service sits behind a reverse proxy.
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

/// Local data layout. Every store lives under one root so a deployment is a
/// single directory to back up.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
    pub fn jobs_dir(&self) -> PathBuf {
        self.data_dir.join("jobs")
    }
    pub fn results_dir(&self) -> PathBuf {
        self.data_dir.join("results")
    }
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("output")
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub api_key: Option<String>,
    pub bucket: Option<String>,
    pub object_prefix: String,
    /// Audio at or below this size is sent inline with the request.
    pub inline_max_bytes: u64,
    pub default_language: String,
    /// Languages retried in order when the primary yields nothing.
    pub lang_fallbacks: Vec<String>,
}

/// Content panel settings (LLM + TTS).
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub openai_api_key: Option<String>,
    pub model_version: String,
    pub tts_voice: String,
    pub tts_speaking_rate: f32,
}

/// Settings for the video-audio download tool.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub cookies_file: Option<PathBuf>,
    /// `browser` or `browser:profile` spec passed to the downloader.
    pub cookies_from_browser: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub stt: SttConfig,
    pub content: ContentConfig,
    pub download: DownloadConfig,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Reads the full configuration from the environment.
    ///
    /// Call [`crate::load_env_file`] first so the dotenv file is visible.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("MEDIA_TOOLKIT_HOST", "127.0.0.1"),
                port: env_parse("PORT", 8000),
                url_prefix: env_or("MEDIA_TOOLKIT_URL_PREFIX", ""),
                max_upload_bytes: 100 * 1024 * 1024,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from(env_or("MEDIA_TOOLKIT_DATA_DIR", "data")),
            },
            stt: SttConfig {
                api_key: env_opt("GOOGLE_API_KEY"),
                bucket: env_opt("GCS_BUCKET").or_else(|| env_opt("A2T_GCS_BUCKET")),
                object_prefix: env_or("GCS_PREFIX", "stt_uploads")
                    .trim_matches('/')
                    .to_string(),
                inline_max_bytes: env_parse("STT_INLINE_MAX_BYTES", 9_000_000),
                default_language: env_or("STT_DEFAULT_LANGUAGE", "pl-PL"),
                lang_fallbacks: env_or("STT_LANG_FALLBACKS", "")
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            content: ContentConfig {
                openai_api_key: env_opt("OPENAI_API_KEY")
                    .or_else(|| env_opt("MEDIA_TOOLKIT_OPENAI_API_KEY")),
                model_version: env_or("DEFAULT_MODEL_VERSION", "gpt-4.1-mini"),
                tts_voice: env_or("MEDIA_TOOLKIT_TTS_VOICE", "pl-PL-Wavenet-A"),
                tts_speaking_rate: env_parse("MEDIA_TOOLKIT_TTS_RATE", 1.0_f32),
            },
            download: DownloadConfig {
                cookies_file: env_opt("YTDLP_COOKIES_FILE").map(PathBuf::from),
                cookies_from_browser: env_opt("YTDLP_COOKIES_FROM_BROWSER"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::from_env();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(config.stt.default_language, "pl-PL");
        assert_eq!(config.stt.object_prefix, "stt_uploads");
        assert_eq!(config.stt.inline_max_bytes, 9_000_000);
        assert_eq!(config.content.model_version, "gpt-4.1-mini");
        assert_eq!(
            config.storage.jobs_dir(),
            config.storage.data_dir.join("jobs")
        );
    }
}
