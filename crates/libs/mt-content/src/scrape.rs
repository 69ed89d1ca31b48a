//! Article extraction from raw HTML.

use std::collections::HashSet;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use crate::media::{MediaItem, detect_media_type};
use crate::prelude::*;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; MediaToolkitBot/1.0; +https://example.local)";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Containers tried, in order, as the article body. The one with the most
/// text wins; `<body>` is the fallback.
const CANDIDATE_SELECTORS: &[&str] = &[
    "article",
    "[role=main]",
    "#content",
    ".content",
    ".article",
    ".post",
    ".entry-content",
    ".news",
    ".story",
];

/// What a page boils down to for the content panel.
#[derive(Debug, Clone, Default)]
pub struct Article {
    pub title: String,
    pub text: String,
    pub media: Vec<MediaItem>,
}

struct ArticleSelectors {
    candidates: Vec<Selector>,
    title: Selector,
    og_title: Selector,
    body: Selector,
    paragraphs: Selector,
    images: Selector,
    videos: Selector,
    sources: Selector,
}

impl ArticleSelectors {
    fn new() -> Self {
        ArticleSelectors {
            candidates: CANDIDATE_SELECTORS
                .iter()
                .map(|selector| Selector::parse(selector).unwrap())
                .collect(),
            title: Selector::parse("title").unwrap(),
            og_title: Selector::parse(r#"meta[property="og:title"]"#).unwrap(),
            body: Selector::parse("body").unwrap(),
            paragraphs: Selector::parse("p, h2, h3, li").unwrap(),
            images: Selector::parse("img").unwrap(),
            videos: Selector::parse("video").unwrap(),
            sources: Selector::parse("source").unwrap(),
        }
    }
}

fn is_unwanted(name: &str) -> bool {
    matches!(
        name,
        "script" | "style" | "noscript" | "nav" | "footer" | "header" | "form" | "aside"
    )
}

/// Whether `el` sits inside boilerplate (nav, footer, script...) under
/// `scope`.
fn in_unwanted(el: ElementRef, scope: ElementRef) -> bool {
    for ancestor in el.ancestors() {
        if ancestor.id() == scope.id() {
            break;
        }
        if let Some(element) = ancestor.value().as_element() {
            if is_unwanted(element.name()) {
                return true;
            }
        }
    }
    false
}

/// Whitespace-normalized text of `el`, skipping text inside boilerplate.
fn clean_text(el: ElementRef) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let mut skip = false;
        for ancestor in node.ancestors() {
            if ancestor.id() == el.id() {
                break;
            }
            if let Some(element) = ancestor.value().as_element() {
                if is_unwanted(element.name()) {
                    skip = true;
                    break;
                }
            }
        }
        if skip {
            continue;
        }
        for word in text.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

fn absolutize(url: &str, base: &str) -> String {
    reqwest::Url::parse(base)
        .ok()
        .and_then(|parsed| parsed.join(url).ok())
        .map(|joined| joined.to_string())
        .unwrap_or_else(|| url.to_string())
}

/// Downloads a page with the toolkit's user agent.
pub async fn fetch_html(http: &reqwest::Client, url: &str) -> Result<String> {
    let response = http
        .get(url)
        .header("user-agent", USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.text().await?)
}

/// Extracts title, body text, and media references from an article page.
pub fn extract_article(html: &str, base_url: &str) -> Article {
    let selectors = ArticleSelectors::new();
    let document = Html::parse_document(html);

    let mut title = document
        .select(&selectors.title)
        .next()
        .map(clean_text)
        .unwrap_or_default();
    if let Some(og) = document
        .select(&selectors.og_title)
        .next()
        .and_then(|meta| meta.value().attr("content"))
    {
        let og = og.trim();
        if !og.is_empty() {
            title = og.to_string();
        }
    }

    let main = selectors
        .candidates
        .iter()
        .filter_map(|selector| document.select(selector).next())
        .max_by_key(|candidate| clean_text(*candidate).len())
        .or_else(|| document.select(&selectors.body).next())
        .unwrap_or_else(|| document.root_element());

    let mut paragraphs = Vec::new();
    for tag in main.select(&selectors.paragraphs) {
        if in_unwanted(tag, main) {
            continue;
        }
        let text = clean_text(tag);
        if text.chars().count() > 2 {
            paragraphs.push(text);
        }
    }
    let text = paragraphs.join("\n").trim().to_string();

    let mut media = Vec::new();
    for img in main.select(&selectors.images) {
        if in_unwanted(img, main) {
            continue;
        }
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .or_else(|| img.value().attr("data-original"));
        let Some(src) = src else { continue };
        let abs = absolutize(src, base_url);
        if let Some(media_type) = detect_media_type(&abs) {
            media.push(MediaItem { media_type, src: abs });
        }
    }
    for video in main.select(&selectors.videos) {
        if in_unwanted(video, main) {
            continue;
        }
        let mut sources: Vec<&str> = Vec::new();
        if let Some(src) = video.value().attr("src") {
            sources.push(src);
        }
        for source in video.select(&selectors.sources) {
            if let Some(src) = source.value().attr("src") {
                sources.push(src);
            }
        }
        for src in sources {
            let abs = absolutize(src, base_url);
            if let Some(media_type) = detect_media_type(&abs) {
                media.push(MediaItem { media_type, src: abs });
            }
        }
    }

    let mut seen = HashSet::new();
    media.retain(|item| seen.insert((item.media_type, item.src.clone())));

    Article { title, text, media }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaType;

    const PAGE: &str = r#"
        <html>
          <head>
            <title>Fallback tytuł</title>
            <meta property="og:title" content="Artykuł dnia" />
          </head>
          <body>
            <nav><p>Menu główne strony</p></nav>
            <article>
              <h2>Śródtytuł</h2>
              <p>Pierwszy akapit z treścią artykułu.</p>
              <p>ok</p>
              <aside><p>Reklama wewnątrz artykułu</p></aside>
              <script>var x = 1;</script>
              <img src="/img/main.jpg" />
              <img data-src="https://cdn.example.pl/lazy.png" />
              <img src="/img/main.jpg" />
              <video src="/vid/clip.mp4"></video>
              <video><source src="/vid/alt.webm" /></video>
            </article>
            <footer><p>Stopka serwisu</p></footer>
          </body>
        </html>
    "#;

    #[test]
    fn og_title_wins_over_title_tag() {
        let article = extract_article(PAGE, "https://example.pl/news/1");
        assert_eq!(article.title, "Artykuł dnia");
    }

    #[test]
    fn body_text_skips_boilerplate_and_short_fragments() {
        let article = extract_article(PAGE, "https://example.pl/news/1");
        assert!(article.text.contains("Śródtytuł"));
        assert!(article.text.contains("Pierwszy akapit"));
        assert!(!article.text.contains("Menu główne"));
        assert!(!article.text.contains("Reklama"));
        assert!(!article.text.contains("var x"));
        assert!(!article.text.contains("ok"));
        assert!(!article.text.contains("Stopka"));
    }

    #[test]
    fn media_is_absolutized_and_deduplicated() {
        let article = extract_article(PAGE, "https://example.pl/news/1");
        let srcs: Vec<&str> = article.media.iter().map(|item| item.src.as_str()).collect();
        assert_eq!(
            srcs,
            vec![
                "https://example.pl/img/main.jpg",
                "https://cdn.example.pl/lazy.png",
                "https://example.pl/vid/clip.mp4",
                "https://example.pl/vid/alt.webm",
            ]
        );
        assert_eq!(article.media[2].media_type, MediaType::Video);
    }

    #[test]
    fn falls_back_to_body_without_candidates() {
        let article = extract_article(
            "<html><body><p>Sama treść bez kontenera.</p></body></html>",
            "https://example.pl/",
        );
        assert_eq!(article.text, "Sama treść bez kontenera.");
        assert!(article.title.is_empty());
    }
}
