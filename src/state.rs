use crate::llm::GeneratedImage;
use crate::prompt::{AttributeSelection, ComposedPrompt, OptionSet};

/// Per-user state carried between interactions; owned by the caller.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SessionState {
    pub theme: Option<String>,
    pub selection: AttributeSelection,
    pub last_prompt: Option<ComposedPrompt>,
    pub last_image: Option<GeneratedImage>,
    pub interactions: u64,
}

impl SessionState {
    pub fn new(options: &OptionSet) -> Self {
        SessionState {
            theme: None,
            selection: AttributeSelection::defaults(options),
            last_prompt: None,
            last_image: None,
            interactions: 0,
        }
    }

    pub fn next_interaction(&mut self) -> u64 {
        self.interactions += 1;
        self.interactions
    }
}
