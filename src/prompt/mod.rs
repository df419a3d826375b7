pub mod compose;
pub mod options;
pub mod suggestion;
pub mod translate;
pub mod vocabulary;

pub use compose::{clean_refined_prompt, compose, compose_selection, ComposedPrompt, MAX_PROMPT_CHARS};
pub use options::{Category, OptionSet};
pub use suggestion::{build_suggestion_request, parse_suggestion, AttributeSelection};
pub use translate::{Selection, TranslationTable};
pub use vocabulary::Vocabulary;
