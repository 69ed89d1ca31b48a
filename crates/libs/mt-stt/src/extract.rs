//! Turning recognizer responses into the transcript model.

use mt_models::transcript::{Transcript, TranscriptAlternative, TranscriptMeta, WordInfo};

use crate::api::RecognizeResponse;

/// Parses an API duration string (`"1.200s"`) into seconds.
pub fn parse_duration(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('s').parse().ok()
}

/// Collapses a recognizer response: best alternative per result, joined into
/// one transcript, with word timings kept when the API returned them.
pub fn extract_transcript(response: &RecognizeResponse) -> Transcript {
    let mut chunks: Vec<String> = Vec::new();
    let mut alternatives = Vec::new();
    let mut diarization_words = Vec::new();

    for result in &response.results {
        let Some(best) = result.alternatives.first() else {
            continue;
        };
        let text = best.transcript.as_deref().unwrap_or("").trim().to_string();
        alternatives.push(TranscriptAlternative {
            transcript: text.clone(),
            confidence: best.confidence.unwrap_or(0.0),
        });
        chunks.push(text);
        for word in &best.words {
            diarization_words.push(WordInfo {
                word: word.word.clone(),
                start_time: word.start_time.as_deref().and_then(parse_duration),
                end_time: word.end_time.as_deref().and_then(parse_duration),
                speaker_tag: word.speaker_tag,
            });
        }
    }

    let transcript = chunks
        .iter()
        .filter(|chunk| !chunk.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    Transcript {
        transcript,
        alternatives,
        diarization_words,
        meta: None,
    }
}

/// Attaches recognition metadata, but only when something was recognized.
/// An empty transcript stays bare so the fallback loop can try another
/// language.
pub fn attach_meta(mut transcript: Transcript, meta: TranscriptMeta) -> Transcript {
    if !transcript.is_empty() {
        transcript.meta = Some(meta);
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "results": [
            {
                "alternatives": [
                    {
                        "transcript": " dzień dobry ",
                        "confidence": 0.92,
                        "words": [
                            {"word": "dzień", "startTime": "0s", "endTime": "0.400s", "speakerTag": 1},
                            {"word": "dobry", "startTime": "0.400s", "endTime": "1.200s", "speakerTag": 1}
                        ]
                    }
                ]
            },
            {
                "alternatives": [
                    {"transcript": "witamy państwa", "confidence": 0.81}
                ]
            },
            {"alternatives": []}
        ]
    }"#;

    #[test]
    fn parses_duration_strings() {
        assert_eq!(parse_duration("1.200s"), Some(1.2));
        assert_eq!(parse_duration("0s"), Some(0.0));
        assert_eq!(parse_duration("garbage"), None);
    }

    #[test]
    fn extracts_best_alternatives_and_words() {
        let response: RecognizeResponse = serde_json::from_str(SAMPLE).unwrap();
        let transcript = extract_transcript(&response);
        assert_eq!(transcript.transcript, "dzień dobry witamy państwa");
        assert_eq!(transcript.alternatives.len(), 2);
        assert_eq!(transcript.alternatives[0].confidence, 0.92);
        assert_eq!(transcript.diarization_words.len(), 2);
        assert_eq!(transcript.diarization_words[1].end_time, Some(1.2));
        assert_eq!(transcript.diarization_words[1].speaker_tag, Some(1));
    }

    #[test]
    fn empty_response_yields_empty_transcript() {
        let transcript = extract_transcript(&RecognizeResponse::default());
        assert!(transcript.is_empty());
        assert!(transcript.alternatives.is_empty());
    }

    #[test]
    fn meta_only_attached_to_non_empty_transcripts() {
        let meta = TranscriptMeta {
            via: "sync".into(),
            language: "pl-PL".into(),
            ..Default::default()
        };
        let empty = attach_meta(Transcript::default(), meta.clone());
        assert!(empty.meta.is_none());

        let full = attach_meta(
            Transcript {
                transcript: "tekst".into(),
                ..Default::default()
            },
            meta,
        );
        assert_eq!(full.meta.unwrap().via, "sync");
    }
}
