//! Per-user content archive entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored prompt result under `output/<username>/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub id: String,
    pub prompt_id: String,
    pub title: String,
    pub source_url: String,
    pub text: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_filename: Option<String>,
}

/// Entry ids double as file names, so only a safe alphabet is accepted.
pub fn is_valid_entry_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Keeps only the safe alphabet from a prompt id, capped at 32 characters.
pub fn sanitize_prompt_id(prompt_id: &str) -> String {
    let safe: String = prompt_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(32)
        .collect();
    if safe.is_empty() {
        String::from("prompt")
    } else {
        safe
    }
}

/// Base entry id for a prompt applied now: `<UTC timestamp>_<prompt>`.
/// Collisions get a numeric suffix from the store.
pub fn entry_id_base(prompt_id: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", now.format("%Y%m%d_%H%M%S"), sanitize_prompt_id(prompt_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entry_id_validation() {
        assert!(is_valid_entry_id("20250101_120000_summary_pl"));
        assert!(is_valid_entry_id("a-b_C9"));
        assert!(!is_valid_entry_id(""));
        assert!(!is_valid_entry_id("../etc/passwd"));
        assert!(!is_valid_entry_id("id with space"));
    }

    #[test]
    fn prompt_id_sanitized_and_capped() {
        assert_eq!(sanitize_prompt_id("summary_pl"), "summary_pl");
        assert_eq!(sanitize_prompt_id("../x"), "x");
        assert_eq!(sanitize_prompt_id("!!!"), "prompt");
        assert_eq!(sanitize_prompt_id(&"a".repeat(64)).len(), 32);
    }

    #[test]
    fn entry_id_base_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(entry_id_base("summary_pl", now), "20250314_092653_summary_pl");
    }
}
