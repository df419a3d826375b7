use serde::Serialize;

use crate::prompt::options::{Category, OptionSet};

pub const STYLE_LABEL: &str = "Style:";
pub const TONE_LABEL: &str = "Color tone:";
pub const MOOD_LABEL: &str = "Mood:";
pub const VIEWPOINT_LABEL: &str = "Viewpoint:";

pub const SUGGESTION_SYSTEM_PROMPT: &str = "You are an art director helping a user plan a single illustration. Given a theme, choose the art style, color tone, mood and viewpoint that would express it best. Only pick values from the option lists you are given, copy them exactly as written, and answer with the four labeled lines requested and nothing else.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSelection {
    pub style: String,
    pub tone: String,
    pub mood: Vec<String>,
    pub viewpoint: String,
    pub image_size: String,
}

impl AttributeSelection {
    /// First option of every category.
    pub fn defaults(options: &OptionSet) -> Self {
        let first = |category| options.default_value(category).unwrap_or("").to_string();
        AttributeSelection {
            style: first(Category::Style),
            tone: first(Category::Tone),
            mood: options
                .default_value(Category::Mood)
                .map(|value| vec![value.to_string()])
                .unwrap_or_default(),
            viewpoint: first(Category::Viewpoint),
            image_size: first(Category::ImageSize),
        }
    }
}

fn find_labeled_value<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let line = text
        .lines()
        .map(str::trim_start)
        .find(|line| line.starts_with(label))?;
    let (_, value) = line.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn split_mood_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Overlays the labeled lines found in `text` on `defaults`.
///
/// Fields whose label is absent (or empty) keep their default; image size is
/// never suggested.
pub fn parse_suggestion(text: &str, defaults: &AttributeSelection) -> AttributeSelection {
    let mut selection = defaults.clone();

    if let Some(style) = find_labeled_value(text, STYLE_LABEL) {
        selection.style = style.to_string();
    }
    if let Some(tone) = find_labeled_value(text, TONE_LABEL) {
        selection.tone = tone.to_string();
    }
    if let Some(mood) = find_labeled_value(text, MOOD_LABEL) {
        let moods = split_mood_list(mood);
        if !moods.is_empty() {
            selection.mood = moods;
        }
    }
    if let Some(viewpoint) = find_labeled_value(text, VIEWPOINT_LABEL) {
        selection.viewpoint = viewpoint.to_string();
    }

    selection
}

pub fn build_suggestion_request(theme: &str, options: &OptionSet) -> String {
    let list = |category| options.values(category).join(", ");
    format!(
        "Theme: {theme}\n\n\
         Style options: {}\n\
         Color tone options: {}\n\
         Mood options (pick one to three): {}\n\
         Viewpoint options: {}\n\n\
         Answer in exactly this format:\n\
         {STYLE_LABEL} <style>\n\
         {TONE_LABEL} <color tone>\n\
         {MOOD_LABEL} <mood>, <mood>\n\
         {VIEWPOINT_LABEL} <viewpoint>",
        list(Category::Style),
        list(Category::Tone),
        list(Category::Mood),
        list(Category::Viewpoint),
    )
}
