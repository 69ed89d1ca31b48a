//! The content panel service tying scraping, prompting, and synthesis
//! together.

use mt_config::config::ContentConfig;
use mt_config::prompts::PromptTemplate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::LlmClient;
use crate::media::{MediaItem, detect_media_type};
use crate::prelude::*;
use crate::scrape::{extract_article, fetch_html};
use crate::summarize::{DEFAULT_MAX_MINUTES, DEFAULT_WPM, summarize_to_duration};
use crate::tts::TtsClient;

/// What the scrap endpoint hands back to the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapPayload {
    pub title: String,
    pub text: String,
    pub media: Vec<MediaItem>,
    pub source_url: String,
}

/// Scraper, model, and synthesis clients behind the content routes. The
/// model and synthesis parts are optional; routes that need a missing one
/// fail with a clear error instead of at startup.
pub struct ContentService {
    http: reqwest::Client,
    llm: Option<LlmClient>,
    tts: Option<TtsClient>,
}

impl ContentService {
    /// Builds the service from config. `google_api_key` enables synthesis
    /// and is shared with the transcription stack.
    pub fn new(config: &ContentConfig, google_api_key: Option<&str>) -> Self {
        let http = reqwest::Client::new();
        let llm = config
            .openai_api_key
            .as_deref()
            .map(|key| LlmClient::new(http.clone(), key, config.model_version.clone()));
        let tts = google_api_key.map(|key| {
            TtsClient::new(http.clone(), key, config.tts_voice.clone(), config.tts_speaking_rate)
        });
        Self { http, llm, tts }
    }

    #[cfg(test)]
    pub(crate) fn with_clients(
        http: reqwest::Client,
        llm: Option<LlmClient>,
        tts: Option<TtsClient>,
    ) -> Self {
        Self { http, llm, tts }
    }

    pub fn llm_available(&self) -> bool {
        self.llm.is_some()
    }

    pub fn tts_available(&self) -> bool {
        self.tts.is_some()
    }

    /// Fetches a page and boils it down to a narration-length payload.
    pub async fn scrap_page(&self, url: &str, language: &str) -> Result<ScrapPayload> {
        let html = fetch_html(&self.http, url).await?;
        let article = extract_article(&html, url);
        info!(
            "scraped {url}: {} text chars, {} media",
            article.text.len(),
            article.media.len()
        );

        let title = if article.title.is_empty() {
            "Materiał".to_string()
        } else {
            article.title
        };
        let full_text = article.text.trim().to_string();
        let summary = summarize_to_duration(
            self.llm.as_ref(),
            &full_text,
            DEFAULT_MAX_MINUTES,
            DEFAULT_WPM,
            language,
        )
        .await?;

        let media = article
            .media
            .into_iter()
            .filter_map(|item| {
                detect_media_type(&item.src).map(|media_type| MediaItem {
                    media_type,
                    src: clean_media_src(&item.src),
                })
            })
            .collect();

        Ok(ScrapPayload {
            title,
            text: if summary.is_empty() { full_text } else { summary },
            media,
            source_url: url.to_string(),
        })
    }

    /// Runs an editorial prompt over scraped data. The payload is embedded
    /// into the user message as pretty-printed JSON.
    pub async fn apply_prompt(
        &self,
        prompt: &PromptTemplate,
        data: &serde_json::Value,
    ) -> Result<String> {
        let llm = self.llm.as_ref().ok_or(Error::LlmUnavailable)?;
        let payload = serde_json::to_string_pretty(data)?;
        let user_prompt = format!("{}\n{}", prompt.user_prefix, payload);
        llm.ask(&prompt.system, &user_prompt, 0.5).await
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let tts = self.tts.as_ref().ok_or(Error::TtsUnavailable)?;
        tts.synthesize(text).await
    }
}

/// CDN image URLs often wrap the original asset (`photo.jpg.webp`) or carry
/// resize parameters; hand the panel the plain asset.
fn clean_media_src(src: &str) -> String {
    if src.ends_with(".webp") {
        if let Some(stripped) = src.split(".webp").next() {
            return stripped.to_string();
        }
    }
    src.split('?').next().unwrap_or(src).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_src_cleanup() {
        assert_eq!(
            clean_media_src("https://cdn.example.pl/photo.jpg.webp"),
            "https://cdn.example.pl/photo.jpg"
        );
        assert_eq!(
            clean_media_src("https://cdn.example.pl/photo.jpg?w=1200"),
            "https://cdn.example.pl/photo.jpg"
        );
        assert_eq!(
            clean_media_src("https://cdn.example.pl/clip.mp4"),
            "https://cdn.example.pl/clip.mp4"
        );
    }

    #[tokio::test]
    async fn apply_prompt_without_model_fails_cleanly() {
        let service = ContentService::with_clients(reqwest::Client::new(), None, None);
        let prompt = PromptTemplate {
            id: "summary_pl".into(),
            label: "Streszczenie".into(),
            system: "Jesteś asystentem.".into(),
            user_prefix: "Streść.\n\nDANE:".into(),
        };
        let err = service
            .apply_prompt(&prompt, &serde_json::json!({"title": "T"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LlmUnavailable));

        let err = service.synthesize("tekst").await.unwrap_err();
        assert!(matches!(err, Error::TtsUnavailable));
    }
}
