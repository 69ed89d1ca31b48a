//! Classifying media references scraped from article pages.

use serde::{Deserialize, Serialize};

const IMG_EXT: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];
const VID_EXT: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// A media reference found in an article, with its resolved URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub src: String,
}

fn classify_ext(ext: &str) -> Option<MediaType> {
    let ext = ext.trim_start_matches('.').to_lowercase();
    if IMG_EXT.contains(&ext.as_str()) {
        return Some(MediaType::Image);
    }
    if VID_EXT.contains(&ext.as_str()) {
        return Some(MediaType::Video);
    }
    None
}

/// Guesses whether a path or URL refers to an image or a video. Looks at
/// `data:` headers, path extensions, then `format=`/`ext=` query parameters.
pub fn detect_media_type(path_or_url: &str) -> Option<MediaType> {
    let s = path_or_url.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(rest) = s.strip_prefix("data:") {
        let header = rest.split(';').next().unwrap_or("").to_lowercase();
        if header.starts_with("image/") {
            return Some(MediaType::Image);
        }
        if header.starts_with("video/") {
            return Some(MediaType::Video);
        }
    }

    let (path, query) = match reqwest::Url::parse(s) {
        Ok(url) => (url.path().to_string(), url.query().unwrap_or("").to_string()),
        Err(_) => (s.to_string(), String::new()),
    };
    let path = path
        .split('?')
        .next()
        .and_then(|part| part.split('#').next())
        .unwrap_or("")
        .to_string();

    // The outermost extension wins, so `clip.mp4.webp` reads as an image.
    let name = path.rsplit('/').next().unwrap_or(&path);
    let suffixes: Vec<&str> = name.split('.').skip(1).collect();
    for ext in suffixes.iter().rev() {
        if let Some(kind) = classify_ext(ext) {
            return Some(kind);
        }
    }

    if !query.is_empty() {
        for pair in query.split('&') {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or("").to_lowercase();
            if key == "format" || key == "ext" {
                if let Some(kind) = parts.next().and_then(classify_ext) {
                    return Some(kind);
                }
            }
        }
    }

    let lower = path.to_lowercase();
    if IMG_EXT.iter().any(|ext| lower.contains(&format!(".{ext}"))) {
        return Some(MediaType::Image);
    }
    if VID_EXT.iter().any(|ext| lower.contains(&format!(".{ext}"))) {
        return Some(MediaType::Video);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(
            detect_media_type("https://example.pl/foto.jpg"),
            Some(MediaType::Image)
        );
        assert_eq!(
            detect_media_type("https://example.pl/clip.mp4?x=1"),
            Some(MediaType::Video)
        );
        assert_eq!(detect_media_type("https://example.pl/page.html"), None);
        assert_eq!(detect_media_type(""), None);
    }

    #[test]
    fn detects_data_uris() {
        assert_eq!(
            detect_media_type("data:image/png;base64,AAAA"),
            Some(MediaType::Image)
        );
        assert_eq!(
            detect_media_type("data:video/mp4;base64,AAAA"),
            Some(MediaType::Video)
        );
        assert_eq!(detect_media_type("data:text/plain,hello"), None);
    }

    #[test]
    fn detects_by_query_format() {
        assert_eq!(
            detect_media_type("https://cdn.example.pl/asset?format=webp"),
            Some(MediaType::Image)
        );
        assert_eq!(
            detect_media_type("https://cdn.example.pl/asset?ext=mp4"),
            Some(MediaType::Video)
        );
    }

    #[test]
    fn wrapped_extension_prefers_outermost() {
        assert_eq!(
            detect_media_type("https://cdn.example.pl/clip.mp4.webp"),
            Some(MediaType::Image)
        );
    }

    #[test]
    fn media_item_serializes_with_type_key() {
        let item = MediaItem {
            media_type: MediaType::Image,
            src: "https://example.pl/a.png".into(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "image");
    }
}
