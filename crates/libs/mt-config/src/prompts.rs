//! Prompt catalog for the content panel.
//!
//! The toolkit ships a built-in set of Polish newsroom templates; a
//! deployment can replace the whole catalog with a TOML file in
//! `data_settings/`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// One prompt template offered in the content panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Stable identifier used by the API.
    pub id: String,
    /// Human-readable label for the picker.
    pub label: String,
    /// System message sent to the model.
    pub system: String,
    /// Prefix prepended to the scraped article payload.
    pub user_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCatalog {
    pub prompts: Vec<PromptTemplate>,
}

impl PromptCatalog {
    /// Load a catalog from a TOML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(file_path)?;
        Self::from_toml(&contents)
    }

    /// Parse a catalog from a TOML string.
    pub fn from_toml(value: &str) -> Result<Self> {
        Ok(toml::from_str(value)?)
    }

    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.prompts.iter().find(|p| p.id == id)
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        let builtin = [
            (
                "test_summary20_pl",
                "Streszczenie TEST PL (max 20 słów)",
                "Jesteś asystentem, który tworzy zwięzłe zajawki do przeczytania artykułu na portalu londynek.net. Zajawka ma być w języku w jakim dostarczone zostały dane.",
                "Napisz zajawkę do artykułu w ~20 słowach.\n\nDANE:",
            ),
            (
                "test_summary50_pl",
                "Streszczenie TEST PL (max 50 słów)",
                "Jesteś asystentem, który tworzy zwięzłe zajawki do przeczytania artykułu na portalu londynek.net. Zajawka ma być w języku w jakim dostarczone zostały dane.",
                "Napisz zajawkę do artykułu w ~50 słowach.\n\nDANE:",
            ),
            (
                "summary_pl",
                "Streszczenie PL (ok. 120 słów)",
                "Jesteś asystentem, który tworzy zwięzłe streszczenia wiadomości po polsku.",
                "Streść poniższy artykuł w ~120 słowach. Zachowaj neutralny ton dziennikarski.\n\nDANE:",
            ),
            (
                "funny_summary_pl",
                "Humorystyczne streszczenie PL (ok. 120 słów)",
                "Jesteś asystentem z dużym poczuciem humoru, zajmujesz się tworzeniem streszczeń wiadomości po polsku.",
                "Streść poniższy artykuł w ~120 słowach.\n\nDANE:",
            ),
            (
                "radio_tone_pl",
                "Przepisz w tonie radiowym (PL)",
                "Jesteś lektorem-redaktorem. Uprość konstrukcje zdań, zachowaj sens.",
                "Przepisz tekst w tonie radiowym do odczytu na antenie. Krótsze zdania, klarowna składnia.\n\nDANE:",
            ),
            (
                "titles5_pl",
                "5 tytułów (PL)",
                "Jesteś redaktorem tytułów prasowych.",
                "Zaproponuj 5 zwięzłych, nieclickbaitowych tytułów na podstawie danych.\n\nDANE:",
            ),
        ];

        Self {
            prompts: builtin
                .into_iter()
                .map(|(id, label, system, user_prefix)| PromptTemplate {
                    id: id.to_string(),
                    label: label.to_string(),
                    system: system.to_string(),
                    user_prefix: user_prefix.to_string(),
                })
                .collect(),
        }
    }
}

/// Loads the catalog, preferring the optional TOML file.
pub fn load_catalog(settings_dir: &Path) -> PromptCatalog {
    let path = settings_dir.join("prompts.toml");
    if path.is_file() {
        match PromptCatalog::from_file(&path) {
            Ok(catalog) => return catalog,
            Err(err) => {
                tracing::warn!("ignoring invalid prompt catalog {}: {err}", path.display());
            }
        }
    }
    PromptCatalog::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        let catalog = PromptCatalog::default();
        assert_eq!(catalog.prompts.len(), 6);
        let prompt = catalog.get("titles5_pl").unwrap();
        assert_eq!(prompt.label, "5 tytułów (PL)");
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn deserialize() -> Result<()> {
        let content = r#"
            # Custom prompt catalog

            [[prompts]]
            id = "short_en"
            label = "Short summary (EN)"
            system = "You summarize news articles."
            user_prefix = "Summarize in ~30 words.\n\nDATA:"

            [[prompts]]
            id = "headline_en"
            label = "Headline (EN)"
            system = "You write newspaper headlines."
            user_prefix = "Propose one headline.\n\nDATA:"
        "#;
        let catalog = PromptCatalog::from_toml(content)?;
        assert_eq!(catalog.prompts.len(), 2);
        assert!(catalog.get("headline_en").is_some());
        Ok(())
    }
}
