use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Style,
    Tone,
    Mood,
    Viewpoint,
    ImageSize,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Style,
        Category::Tone,
        Category::Mood,
        Category::Viewpoint,
        Category::ImageSize,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Style => "style",
            Category::Tone => "tone",
            Category::Mood => "mood",
            Category::Viewpoint => "viewpoint",
            Category::ImageSize => "image_size",
        }
    }

    /// Korean label shown next to the option list.
    pub fn display_label(self) -> &'static str {
        match self {
            Category::Style => "🎨 화풍",
            Category::Tone => "🌈 색감",
            Category::Mood => "💫 분위기",
            Category::Viewpoint => "📷 시점",
            Category::ImageSize => "🖼️ 이미지 크기",
        }
    }

    pub fn is_multi_valued(self) -> bool {
        matches!(self, Category::Mood)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "style" => Ok(Category::Style),
            "tone" | "color_tone" | "color tone" => Ok(Category::Tone),
            "mood" => Ok(Category::Mood),
            "viewpoint" => Ok(Category::Viewpoint),
            "image_size" | "size" => Ok(Category::ImageSize),
            other => Err(anyhow!("Unknown attribute category: {other}")),
        }
    }
}

pub(crate) const STYLE_OPTIONS: &[(&str, &str)] = &[
    ("수채화", "watercolor painting"),
    ("유화", "oil painting"),
    ("연필 스케치", "pencil sketch"),
    ("디지털 아트", "digital art"),
    ("애니메이션", "anime illustration"),
    ("사실적인 사진", "photorealistic photograph"),
    ("픽셀 아트", "pixel art"),
    ("팝아트", "pop art"),
    ("동양화", "traditional East Asian ink painting"),
    ("3D 렌더링", "3D render"),
];

pub(crate) const TONE_OPTIONS: &[(&str, &str)] = &[
    ("따뜻한 색감", "warm color palette"),
    ("차가운 색감", "cool color palette"),
    ("파스텔 톤", "soft pastel tones"),
    ("흑백", "black and white"),
    ("비비드", "vivid saturated colors"),
    ("어두운 톤", "dark moody tones"),
    ("빈티지", "vintage faded colors"),
];

pub(crate) const MOOD_OPTIONS: &[(&str, &str)] = &[
    ("몽환적", "dreamy"),
    ("희망", "hopeful"),
    ("고요함", "calm"),
    ("슬픔", "sad"),
    ("신비로움", "mysterious"),
    ("평화로움", "peaceful"),
    ("활기참", "energetic"),
    ("웅장함", "majestic"),
    ("따뜻함", "warm"),
    ("긴장감", "tense"),
    ("외로움", "lonely"),
    ("행복", "joyful"),
];

pub(crate) const VIEWPOINT_OPTIONS: &[(&str, &str)] = &[
    ("정면", "front view"),
    ("측면", "side view"),
    ("위에서 내려다본", "bird's-eye view"),
    ("아래에서 올려다본", "low-angle view"),
    ("클로즈업", "close-up"),
    ("원경", "wide landscape shot"),
    ("1인칭 시점", "first-person perspective"),
];

pub(crate) const IMAGE_SIZE_OPTIONS: &[(&str, &str)] = &[
    ("정사각형 (1024x1024)", "1024x1024"),
    ("가로형 (1792x1024)", "1792x1024"),
    ("세로형 (1024x1792)", "1024x1792"),
];

pub(crate) fn builtin_entries(category: Category) -> &'static [(&'static str, &'static str)] {
    match category {
        Category::Style => STYLE_OPTIONS,
        Category::Tone => TONE_OPTIONS,
        Category::Mood => MOOD_OPTIONS,
        Category::Viewpoint => VIEWPOINT_OPTIONS,
        Category::ImageSize => IMAGE_SIZE_OPTIONS,
    }
}

/// Ordered, localized display strings per category.
#[derive(Debug, Clone)]
pub struct OptionSet {
    values: HashMap<Category, Vec<String>>,
}

impl OptionSet {
    pub fn korean() -> Self {
        let values = Category::ALL
            .iter()
            .map(|category| {
                let entries = builtin_entries(*category)
                    .iter()
                    .map(|(value, _)| value.to_string())
                    .collect::<Vec<_>>();
                (*category, entries)
            })
            .collect();
        OptionSet { values }
    }

    pub fn values(&self, category: Category) -> &[String] {
        self.values
            .get(&category)
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, category: Category, value: &str) -> bool {
        self.values(category).iter().any(|entry| entry == value)
    }

    /// First option of the category, used when nothing was chosen.
    pub fn default_value(&self, category: Category) -> Option<&str> {
        self.values(category).first().map(|value| value.as_str())
    }

    pub(crate) fn push(&mut self, category: Category, value: &str) -> bool {
        if self.contains(category, value) {
            return false;
        }
        self.values
            .entry(category)
            .or_default()
            .push(value.to_string());
        true
    }
}

impl Default for OptionSet {
    fn default() -> Self {
        OptionSet::korean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_category_aliases() {
        assert_eq!("Color tone".parse::<Category>().unwrap(), Category::Tone);
        assert_eq!("size".parse::<Category>().unwrap(), Category::ImageSize);
        assert!("palette".parse::<Category>().is_err());
    }

    #[test]
    fn korean_options_keep_declared_order() {
        let options = OptionSet::korean();
        assert_eq!(options.default_value(Category::Style), Some("수채화"));
        assert_eq!(options.values(Category::Mood)[1], "희망");
        assert_eq!(options.values(Category::ImageSize).len(), 3);
    }

    #[test]
    fn push_skips_existing_values() {
        let mut options = OptionSet::korean();
        assert!(!options.push(Category::Tone, "흑백"));
        assert!(options.push(Category::Tone, "세피아"));
        assert_eq!(options.values(Category::Tone).last().unwrap(), "세피아");
    }
}
