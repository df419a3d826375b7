use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::prompt::options::Category;
use crate::prompt::suggestion::AttributeSelection;
use crate::prompt::translate::{Selection, TranslationTable};

pub const MAX_PROMPT_CHARS: usize = 1000;

pub const REFINE_SYSTEM_PROMPT: &str = "You write prompts for an image generation model. Turn the user's request into one vivid English paragraph describing the picture: subject, composition, lighting, colors and texture. Do not add a title, explanations, lists or quotation marks. Keep it under 900 characters.";

static THINK_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think block regex"));
static PROMPT_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(image\s+)?prompt\s*:\s*").expect("valid prompt label regex"));

/// Prompt text capped at [`MAX_PROMPT_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt(String);

impl ComposedPrompt {
    pub fn new(text: &str) -> Self {
        ComposedPrompt(truncate_chars(text, MAX_PROMPT_CHARS))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for ComposedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ComposedPrompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((byte_index, _)) => input[..byte_index].to_string(),
        None => input.to_string(),
    }
}

/// Builds the instruction sent to the prompt-writing model.
///
/// Attribute arguments are expected to be canonical phrases already.
pub fn compose(theme: &str, style: &str, tone: &str, mood: &str, viewpoint: &str) -> ComposedPrompt {
    let text = format!(
        "Write an image generation prompt for the theme \"{}\". \
         Art style: {}. Color tone: {}. Mood: {}. Viewpoint: {}. \
         Describe the scene in rich visual detail so the picture clearly conveys the theme.",
        theme.trim(),
        style,
        tone,
        mood,
        viewpoint
    );
    ComposedPrompt::new(&text)
}

pub fn compose_selection(
    theme: &str,
    selection: &AttributeSelection,
    table: &TranslationTable,
) -> ComposedPrompt {
    let style = table.normalize(Category::Style, &Selection::single(selection.style.as_str()));
    let tone = table.normalize(Category::Tone, &Selection::single(selection.tone.as_str()));
    let mood = table.normalize(Category::Mood, &Selection::Multiple(selection.mood.clone()));
    let viewpoint = table.normalize(
        Category::Viewpoint,
        &Selection::single(selection.viewpoint.as_str()),
    );
    compose(theme, &style, &tone, &mood, &viewpoint)
}

/// Strips model chatter around the refined prompt; `None` when nothing is left.
pub fn clean_refined_prompt(raw: &str) -> Option<ComposedPrompt> {
    let without_thinking = THINK_BLOCK_RE.replace_all(raw, "");
    let without_label = PROMPT_LABEL_RE.replace(without_thinking.trim(), "");
    let cleaned = without_label
        .trim()
        .trim_matches(|ch: char| matches!(ch, '"' | '\'' | '`' | '“' | '”'))
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(ComposedPrompt::new(cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::options::OptionSet;

    #[test]
    fn embeds_theme_and_attributes() {
        let prompt = compose("  봄날의 고양이 ", "watercolor painting", "soft pastel tones", "dreamy, hopeful", "close-up");
        assert_eq!(
            prompt.as_str(),
            "Write an image generation prompt for the theme \"봄날의 고양이\". Art style: watercolor painting. Color tone: soft pastel tones. Mood: dreamy, hopeful. Viewpoint: close-up. Describe the scene in rich visual detail so the picture clearly conveys the theme."
        );
    }

    #[test]
    fn long_output_is_cut_to_the_limit() {
        let theme = "가".repeat(1500);
        let prompt = compose(&theme, "a", "b", "c", "d");
        assert_eq!(prompt.char_count(), MAX_PROMPT_CHARS);
        assert!(prompt.as_str().starts_with("Write an image generation prompt"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("🌸🌸🌸", 2), "🌸🌸");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn composes_from_localized_selection() {
        let table = TranslationTable::korean_to_english();
        let selection = AttributeSelection {
            style: "유화".to_string(),
            tone: "따뜻한 색감".to_string(),
            mood: vec!["몽환적".to_string(), "희망".to_string()],
            viewpoint: "드론 시점".to_string(),
            ..AttributeSelection::defaults(&OptionSet::korean())
        };
        let prompt = compose_selection("등대", &selection, &table);
        assert!(prompt.as_str().contains("Art style: oil painting."));
        assert!(prompt.as_str().contains("Color tone: warm color palette."));
        assert!(prompt.as_str().contains("Mood: dreamy, hopeful."));
        assert!(prompt.as_str().contains("Viewpoint: 드론 시점."));
    }

    #[test]
    fn cleanup_removes_thinking_labels_and_quotes() {
        let raw = "<think>\nthe user wants a cat\n</think>\nPrompt: \"A sleepy cat on a sunlit windowsill.\"";
        let cleaned = clean_refined_prompt(raw).unwrap();
        assert_eq!(cleaned.as_str(), "A sleepy cat on a sunlit windowsill.");
    }

    #[test]
    fn cleanup_of_empty_output_is_none() {
        assert!(clean_refined_prompt("  <think>hmm</think>  ").is_none());
        assert!(clean_refined_prompt("\"\"").is_none());
    }

    #[test]
    fn cleanup_caps_length() {
        let raw = "x".repeat(MAX_PROMPT_CHARS + 50);
        assert_eq!(clean_refined_prompt(&raw).unwrap().char_count(), MAX_PROMPT_CHARS);
    }
}
