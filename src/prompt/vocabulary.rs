use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::prompt::options::{Category, OptionSet};
use crate::prompt::translate::TranslationTable;

#[derive(Debug, Clone, Deserialize)]
struct VocabularyEntry {
    value: String,
    phrase: String,
}

type VocabularyFile = BTreeMap<String, Vec<VocabularyEntry>>;

/// Option lists together with the table that translates them.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub options: OptionSet,
    pub table: TranslationTable,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary {
            options: OptionSet::korean(),
            table: TranslationTable::korean_to_english(),
        }
    }
}

impl Vocabulary {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut vocabulary = Vocabulary::default();
        let Some(path) = path else {
            return Ok(vocabulary);
        };

        if !path.exists() {
            warn!("Vocabulary file not found at {}; using built-in options", path.display());
            return Ok(vocabulary);
        }

        let raw = fs::read_to_string(path)
            .map_err(|err| anyhow!("Failed to read vocabulary file '{}': {}", path.display(), err))?;
        let added = vocabulary
            .apply_yaml(&raw)
            .map_err(|err| anyhow!("Invalid vocabulary file '{}': {}", path.display(), err))?;
        info!("Loaded {} vocabulary entr(ies) from {}", added, path.display());

        let missing = vocabulary.table.missing_keys(&vocabulary.options);
        if !missing.is_empty() {
            warn!("{} option(s) have no translation and will pass through verbatim", missing.len());
        }
        Ok(vocabulary)
    }

    /// Returns the number of entries applied.
    pub fn apply_yaml(&mut self, raw: &str) -> Result<usize> {
        if raw.trim().is_empty() {
            return Ok(0);
        }
        let parsed: VocabularyFile =
            serde_yaml::from_str(raw).map_err(|err| anyhow!("YAML parse error: {}", err))?;

        let mut applied = 0;
        for (key, entries) in parsed {
            let category = key.parse::<Category>()?;
            for entry in entries {
                let value = entry.value.trim();
                let phrase = entry.phrase.trim();
                if value.is_empty() || phrase.is_empty() {
                    warn!("Skipping vocabulary entry with empty value or phrase in '{}'", key);
                    continue;
                }
                self.options.push(category, value);
                self.table.insert(category, value, phrase);
                applied += 1;
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::translate::Selection;

    #[test]
    fn yaml_extends_options_and_overrides_phrases() {
        let mut vocabulary = Vocabulary::default();
        let applied = vocabulary
            .apply_yaml(
                "mood:\n  - value: 그리움\n    phrase: nostalgic longing\nstyle:\n  - value: 수채화\n    phrase: loose wet-on-wet watercolor\n",
            )
            .unwrap();
        assert_eq!(applied, 2);
        assert!(vocabulary.options.contains(Category::Mood, "그리움"));
        assert_eq!(
            vocabulary.options.values(Category::Style).iter().filter(|v| *v == "수채화").count(),
            1
        );
        assert_eq!(
            vocabulary.table.normalize(Category::Style, &Selection::single("수채화")),
            "loose wet-on-wet watercolor"
        );
        assert!(vocabulary.table.missing_keys(&vocabulary.options).is_empty());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut vocabulary = Vocabulary::default();
        let err = vocabulary
            .apply_yaml("palette:\n  - value: 금색\n    phrase: gold\n")
            .unwrap_err();
        assert!(err.to_string().contains("palette"));
    }

    #[test]
    fn blank_entries_are_skipped() {
        let mut vocabulary = Vocabulary::default();
        let applied = vocabulary
            .apply_yaml("tone:\n  - value: \"  \"\n    phrase: nothing\n")
            .unwrap();
        assert_eq!(applied, 0);
    }

    #[test]
    fn missing_file_falls_back_to_builtins() {
        let path = std::env::temp_dir().join("theme_canvas_missing_vocabulary.yaml");
        let vocabulary = Vocabulary::load(Some(&path)).unwrap();
        assert_eq!(vocabulary.options.values(Category::Mood).len(), 12);
    }
}
