use std::collections::HashMap;

use crate::prompt::options::{builtin_entries, Category, OptionSet};

pub const PHRASE_SEPARATOR: &str = ", ";

/// A category value as chosen by the user or proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Single(String),
    Multiple(Vec<String>),
}

impl Selection {
    pub fn single(value: impl Into<String>) -> Self {
        Selection::Single(value.into())
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::Single(value.to_string())
    }
}

impl From<Vec<String>> for Selection {
    fn from(values: Vec<String>) -> Self {
        Selection::Multiple(values)
    }
}

/// Localized display string -> canonical English phrase, per category.
///
/// Lookups never fail: an unmapped value is returned verbatim.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    phrases: HashMap<Category, HashMap<String, String>>,
}

impl TranslationTable {
    pub fn korean_to_english() -> Self {
        let mut table = TranslationTable::default();
        for category in Category::ALL {
            for (value, phrase) in builtin_entries(category) {
                table.insert(category, value, phrase);
            }
        }
        table
    }

    pub fn insert(&mut self, category: Category, value: &str, phrase: &str) {
        self.phrases
            .entry(category)
            .or_default()
            .insert(value.to_string(), phrase.to_string());
    }

    pub fn lookup(&self, category: Category, value: &str) -> Option<&str> {
        self.phrases
            .get(&category)
            .and_then(|entries| entries.get(value))
            .map(|phrase| phrase.as_str())
    }

    pub fn translate_one(&self, category: Category, value: &str) -> String {
        self.lookup(category, value)
            .map(|phrase| phrase.to_string())
            .unwrap_or_else(|| value.to_string())
    }

    pub fn normalize(&self, category: Category, value: &Selection) -> String {
        match value {
            Selection::Single(value) => self.translate_one(category, value),
            Selection::Multiple(values) => values
                .iter()
                .map(|value| self.translate_one(category, value))
                .collect::<Vec<_>>()
                .join(PHRASE_SEPARATOR),
        }
    }

    /// Option values with no translation, in option order.
    pub fn missing_keys(&self, options: &OptionSet) -> Vec<(Category, String)> {
        let mut missing = Vec::new();
        for category in Category::ALL {
            for value in options.values(category) {
                if self.lookup(category, value).is_none() {
                    missing.push((category, value.clone()));
                }
            }
        }
        missing
    }
}
