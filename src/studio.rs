use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use crate::llm::{self, AudioClip, GeneratedImage, ImageGenerationError};
use crate::prompt::compose::REFINE_SYSTEM_PROMPT;
use crate::prompt::suggestion::SUGGESTION_SYSTEM_PROMPT;
use crate::prompt::{
    build_suggestion_request, clean_refined_prompt, compose_selection, parse_suggestion,
    AttributeSelection, Category, ComposedPrompt, Selection, Vocabulary,
};
use crate::state::SessionState;
use crate::utils::timing::{complete_interaction_timer, start_interaction_timer};

/// The external AI capabilities one interaction needs.
#[allow(async_fn_in_trait)]
pub trait CreativeBackend {
    async fn complete(&self, system_prompt: &str, user_content: &str, operation: &str) -> Result<String>;

    async fn generate_image(
        &self,
        prompt: &ComposedPrompt,
        size: &str,
    ) -> Result<GeneratedImage, ImageGenerationError>;

    async fn transcribe(&self, clip: &AudioClip) -> Result<String>;
}

/// Backend talking to the OpenAI-compatible endpoints from `CONFIG`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiBackend;

impl CreativeBackend for OpenAiBackend {
    async fn complete(&self, system_prompt: &str, user_content: &str, operation: &str) -> Result<String> {
        llm::call_chat_completion(system_prompt, user_content, operation).await
    }

    async fn generate_image(
        &self,
        prompt: &ComposedPrompt,
        size: &str,
    ) -> Result<GeneratedImage, ImageGenerationError> {
        llm::generate_image(prompt, size).await
    }

    async fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        llm::transcribe_audio(clip).await
    }
}

#[derive(Debug, Clone)]
pub struct InteractionRequest {
    pub theme: String,
    pub use_ai_suggestions: bool,
    pub selection: AttributeSelection,
}

#[derive(Debug, Clone)]
pub struct InteractionOutcome {
    pub selection: AttributeSelection,
    pub suggestion_text: Option<String>,
    pub instruction: ComposedPrompt,
    pub prompt: ComposedPrompt,
    pub image_size: String,
    pub image: GeneratedImage,
}

fn require_theme(theme: &str) -> Result<&str> {
    let theme = theme.trim();
    if theme.is_empty() {
        return Err(anyhow!("Please enter a theme first"));
    }
    Ok(theme)
}

pub async fn theme_from_voice<B: CreativeBackend>(backend: &B, clip: &AudioClip) -> Result<String> {
    let transcript = backend.transcribe(clip).await?;
    let theme = require_theme(&transcript)?.to_string();
    info!("Theme recognized from voice: {}", theme);
    Ok(theme)
}

/// Asks the model for attribute values and overlays them on `base`.
pub async fn suggest_attributes<B: CreativeBackend>(
    backend: &B,
    vocabulary: &Vocabulary,
    theme: &str,
    base: &AttributeSelection,
) -> Result<(AttributeSelection, String)> {
    let theme = require_theme(theme)?;
    let request = build_suggestion_request(theme, &vocabulary.options);
    let text = backend
        .complete(SUGGESTION_SYSTEM_PROMPT, &request, "suggest_attributes")
        .await?;
    let selection = parse_suggestion(&text, base);
    if selection == *base {
        warn!("Suggestion response did not change any attribute");
    }
    debug!("Suggested selection: {:?}", selection);
    Ok((selection, text))
}

pub async fn refine_prompt<B: CreativeBackend>(
    backend: &B,
    instruction: &ComposedPrompt,
) -> Result<ComposedPrompt> {
    let raw = backend
        .complete(REFINE_SYSTEM_PROMPT, instruction.as_str(), "refine_prompt")
        .await?;
    match clean_refined_prompt(&raw) {
        Some(prompt) => Ok(prompt),
        None => {
            warn!("Prompt refinement returned nothing usable; submitting the instruction as-is");
            Ok(instruction.clone())
        }
    }
}

async fn run_pipeline<B: CreativeBackend>(
    backend: &B,
    vocabulary: &Vocabulary,
    request: &InteractionRequest,
) -> Result<InteractionOutcome> {
    let theme = require_theme(&request.theme)?;

    let (selection, suggestion_text) = if request.use_ai_suggestions {
        let (selection, text) =
            suggest_attributes(backend, vocabulary, theme, &request.selection).await?;
        (selection, Some(text))
    } else {
        (request.selection.clone(), None)
    };

    let instruction = compose_selection(theme, &selection, &vocabulary.table);
    let prompt = refine_prompt(backend, &instruction).await?;
    let image_size = vocabulary.table.normalize(
        Category::ImageSize,
        &Selection::single(selection.image_size.as_str()),
    );

    let image = backend.generate_image(&prompt, &image_size).await?;
    Ok(InteractionOutcome {
        selection,
        suggestion_text,
        instruction,
        prompt,
        image_size,
        image,
    })
}

/// One full pass: suggestion (optional), composition, refinement, image.
pub async fn run_interaction<B: CreativeBackend>(
    backend: &B,
    vocabulary: &Vocabulary,
    state: &mut SessionState,
    request: InteractionRequest,
) -> Result<InteractionOutcome> {
    let interaction = state.next_interaction();
    let mut timer = start_interaction_timer("generate", interaction, Some(&request.theme));

    let result = run_pipeline(backend, vocabulary, &request).await;
    match &result {
        Ok(outcome) => {
            complete_interaction_timer(&mut timer, "success", None);
            state.theme = Some(request.theme.trim().to_string());
            state.selection = outcome.selection.clone();
            state.last_prompt = Some(outcome.prompt.clone());
            state.last_image = Some(outcome.image.clone());
        }
        Err(err) => {
            complete_interaction_timer(&mut timer, "error", Some(err.to_string()));
        }
    }
    result
}
