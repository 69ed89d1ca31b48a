//! Shortening article text to a spoken-duration budget.

use tracing::debug;

use crate::llm::LlmClient;
use crate::prelude::*;

/// Words per minute of a news narrator; the budget leaves 10% headroom.
pub const DEFAULT_WPM: u32 = 160;
pub const DEFAULT_MAX_MINUTES: f64 = 2.0;

/// Word budget for a summary meant to be read aloud in `max_minutes`.
pub fn word_budget(max_minutes: f64, wpm: u32) -> usize {
    ((wpm as f64 * max_minutes * 0.9) as usize).max(50)
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut boundary = false;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            boundary = true;
        } else if boundary && ch.is_whitespace() {
            let sentence = text[start..idx].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = idx;
            boundary = false;
        } else {
            boundary = false;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Extractive fallback used when no model is configured: keep whole leading
/// sentences while they fit the budget.
pub fn fallback_summarize(text: &str, target_words: usize) -> String {
    let mut collected: Vec<&str> = Vec::new();
    let mut total = 0;
    for sentence in split_sentences(text) {
        let words = sentence.split_whitespace().count();
        if total + words > target_words {
            break;
        }
        collected.push(sentence);
        total += words;
    }
    if collected.is_empty() {
        let tokens: Vec<&str> = text.split_whitespace().take(target_words).collect();
        return tokens.join(" ");
    }
    collected.join(" ").trim().to_string()
}

fn truncate_words(text: &str, max_words: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() > max_words {
        tokens[..max_words].join(" ")
    } else {
        text.to_string()
    }
}

/// Summarizes `text` to fit the narration budget, through the model when one
/// is configured and extractively otherwise.
pub async fn summarize_to_duration(
    llm: Option<&LlmClient>,
    text: &str,
    max_minutes: f64,
    wpm: u32,
    language: &str,
) -> Result<String> {
    let max_words = word_budget(max_minutes, wpm);
    if let Some(llm) = llm {
        let prompt = format!(
            "Streść poniższy tekst w języku {language} tak, aby mieścił się w około {max_words} słowach. \
             Zachowaj najważniejsze fakty i klarowną narrację dla lektora newsowego.\n\
             Na zakończenie dodaj informację na temat źródła czyli londynek.net \n\n\
             --- TEKST ---\n{text}\n--- KONIEC ---"
        );
        match llm.ask("", &prompt, 0.3).await {
            Ok(summary) => return Ok(truncate_words(&summary, max_words)),
            Err(err) => debug!("model summary failed, falling back: {err}"),
        }
    }
    Ok(fallback_summarize(text, max_words))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_has_a_floor() {
        assert_eq!(word_budget(2.0, 160), 288);
        assert_eq!(word_budget(0.1, 100), 50);
    }

    #[test]
    fn fallback_keeps_whole_sentences() {
        let text = "Pierwsze zdanie ma pięć słów tutaj. Drugie zdanie też jest krótkie. \
                    Trzecie zdanie już się nie zmieści w limicie.";
        let summary = fallback_summarize(text, 11);
        assert_eq!(
            summary,
            "Pierwsze zdanie ma pięć słów tutaj. Drugie zdanie też jest krótkie."
        );
    }

    #[test]
    fn fallback_truncates_when_no_sentence_fits() {
        let text = "jedno bardzo długie zdanie bez żadnej kropki które ciągnie się w nieskończoność";
        let summary = fallback_summarize(text, 4);
        assert_eq!(summary, "jedno bardzo długie zdanie");
    }

    #[test]
    fn sentences_split_on_terminators() {
        let parts = split_sentences("Ala ma kota. Kot ma Alę! Kto ma psa?");
        assert_eq!(parts, vec!["Ala ma kota.", "Kot ma Alę!", "Kto ma psa?"]);
    }

    #[tokio::test]
    async fn without_model_the_fallback_runs() {
        let summary = summarize_to_duration(None, "Krótki tekst do streszczenia.", 2.0, 160, "pl")
            .await
            .unwrap();
        assert_eq!(summary, "Krótki tekst do streszczenia.");
    }
}
