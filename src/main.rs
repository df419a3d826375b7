use std::path::PathBuf;

use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use tracing::{debug, error, info, warn};

mod config;
mod download;
mod llm;
mod prompt;
mod state;
mod studio;
mod utils;

use config::CONFIG;
use llm::AudioClip;
use prompt::suggestion::split_mood_list;
use prompt::{compose_selection, AttributeSelection, Category, OptionSet, Vocabulary};
use state::SessionState;
use studio::{run_interaction, suggest_attributes, theme_from_voice, InteractionRequest, OpenAiBackend};
use utils::logging::init_logging;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct SelectionArgs {
    style: Option<String>,
    tone: Option<String>,
    mood: Option<Vec<String>>,
    viewpoint: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GenerateArgs {
    theme: Option<String>,
    voice: Option<PathBuf>,
    use_ai_suggestions: bool,
    selection: SelectionArgs,
    out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    Options,
    Compose {
        theme: String,
        selection: SelectionArgs,
    },
    Suggest {
        theme: String,
    },
    Transcribe {
        file: PathBuf,
    },
    Generate(GenerateArgs),
}

fn usage() -> &'static str {
    "Usage:\n  theme_canvas options\n  theme_canvas compose --theme <text> [--style <s>] [--tone <t>] [--mood <a,b>] [--viewpoint <v>]\n  theme_canvas suggest --theme <text>\n  theme_canvas transcribe --file <audio>\n  theme_canvas generate (--theme <text> | --voice <audio>) [--ai] [--style <s>] [--tone <t>] [--mood <a,b>] [--viewpoint <v>] [--size <size>] [--out <dir>]"
}

fn take_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> Result<&'a str> {
    *index += 1;
    args.get(*index)
        .map(|value| value.as_str())
        .filter(|value| !value.starts_with("--"))
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

fn parse_cli_args(args: &[String]) -> Result<CliCommand> {
    let Some(command) = args.get(1).map(|value| value.as_str()) else {
        return Err(anyhow!(usage()));
    };

    let mut theme: Option<String> = None;
    let mut voice: Option<PathBuf> = None;
    let mut file: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut use_ai_suggestions = false;
    let mut selection = SelectionArgs::default();

    let mut index = 2;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "--theme" => theme = Some(take_value(args, &mut index, flag)?.to_string()),
            "--voice" => voice = Some(PathBuf::from(take_value(args, &mut index, flag)?)),
            "--file" => file = Some(PathBuf::from(take_value(args, &mut index, flag)?)),
            "--out" => out_dir = Some(PathBuf::from(take_value(args, &mut index, flag)?)),
            "--style" => selection.style = Some(take_value(args, &mut index, flag)?.to_string()),
            "--tone" => selection.tone = Some(take_value(args, &mut index, flag)?.to_string()),
            "--mood" => selection.mood = Some(split_mood_list(take_value(args, &mut index, flag)?)),
            "--viewpoint" => {
                selection.viewpoint = Some(take_value(args, &mut index, flag)?.to_string())
            }
            "--size" => selection.size = Some(take_value(args, &mut index, flag)?.to_string()),
            "--ai" => use_ai_suggestions = true,
            "--help" | "-h" => return Err(anyhow!(usage())),
            other => {
                return Err(anyhow!("Unknown argument: {other}\n{}", usage()));
            }
        }
        index += 1;
    }

    match command {
        "options" => Ok(CliCommand::Options),
        "compose" => Ok(CliCommand::Compose {
            theme: theme.ok_or_else(|| anyhow!("--theme is required"))?,
            selection,
        }),
        "suggest" => Ok(CliCommand::Suggest {
            theme: theme.ok_or_else(|| anyhow!("--theme is required"))?,
        }),
        "transcribe" => Ok(CliCommand::Transcribe {
            file: file.ok_or_else(|| anyhow!("--file is required"))?,
        }),
        "generate" => {
            if theme.is_some() == voice.is_some() {
                return Err(anyhow!("Exactly one of --theme or --voice is required"));
            }
            Ok(CliCommand::Generate(GenerateArgs {
                theme,
                voice,
                use_ai_suggestions,
                selection,
                out_dir,
            }))
        }
        "--help" | "-h" | "help" => Err(anyhow!(usage())),
        other => Err(anyhow!("Unknown command: {other}\n{}", usage())),
    }
}

fn warn_if_unlisted(options: &OptionSet, category: Category, value: &str) {
    if !options.contains(category, value) {
        warn!(
            "'{}' is not a listed {} option; it will be used verbatim",
            value, category
        );
    }
}

fn apply_selection_args(
    base: &AttributeSelection,
    args: &SelectionArgs,
    options: &OptionSet,
) -> AttributeSelection {
    let mut selection = base.clone();
    if let Some(style) = &args.style {
        warn_if_unlisted(options, Category::Style, style);
        selection.style = style.clone();
    }
    if let Some(tone) = &args.tone {
        warn_if_unlisted(options, Category::Tone, tone);
        selection.tone = tone.clone();
    }
    if let Some(mood) = args.mood.as_ref().filter(|mood| !mood.is_empty()) {
        for value in mood {
            warn_if_unlisted(options, Category::Mood, value);
        }
        selection.mood = mood.clone();
    }
    if let Some(viewpoint) = &args.viewpoint {
        warn_if_unlisted(options, Category::Viewpoint, viewpoint);
        selection.viewpoint = viewpoint.clone();
    }
    if let Some(size) = &args.size {
        selection.image_size = size.clone();
    }
    selection
}

fn print_options(options: &OptionSet) {
    for category in Category::ALL {
        let marker = if category.is_multi_valued() { " (multiple)" } else { "" };
        println!("{} [{}]{}", category.display_label(), category, marker);
        for value in options.values(category) {
            println!("  - {}", value);
        }
    }
}

fn print_selection(selection: &AttributeSelection) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(selection)?);
    Ok(())
}

async fn run_command(command: CliCommand, vocabulary: &Vocabulary) -> Result<()> {
    let backend = OpenAiBackend;
    let mut session = SessionState::new(&vocabulary.options);

    match command {
        CliCommand::Options => print_options(&vocabulary.options),
        CliCommand::Compose { theme, selection } => {
            let selection = apply_selection_args(&session.selection, &selection, &vocabulary.options);
            let instruction = compose_selection(&theme, &selection, &vocabulary.table);
            println!("{}", instruction);
        }
        CliCommand::Suggest { theme } => {
            let (selection, _) =
                suggest_attributes(&backend, vocabulary, &theme, &session.selection).await?;
            print_selection(&selection)?;
        }
        CliCommand::Transcribe { file } => {
            let clip = AudioClip::read(&file).await?;
            let transcript = theme_from_voice(&backend, &clip).await?;
            println!("{}", transcript);
        }
        CliCommand::Generate(args) => {
            let theme = match (&args.theme, &args.voice) {
                (Some(theme), _) => theme.clone(),
                (None, Some(path)) => {
                    let clip = AudioClip::read(path).await?;
                    theme_from_voice(&backend, &clip).await?
                }
                (None, None) => return Err(anyhow!("A theme is required")),
            };

            let request = InteractionRequest {
                theme,
                use_ai_suggestions: args.use_ai_suggestions,
                selection: apply_selection_args(
                    &session.selection,
                    &args.selection,
                    &vocabulary.options,
                ),
            };
            let outcome = run_interaction(&backend, vocabulary, &mut session, request).await?;

            let out_dir = args.out_dir.unwrap_or_else(|| CONFIG.output_dir.clone());
            let path = download::save_image(&outcome.image, &out_dir).await?;

            if args.use_ai_suggestions {
                debug!("Raw suggestion: {:?}", outcome.suggestion_text);
                print_selection(&outcome.selection)?;
            }
            println!("Prompt: {}", outcome.prompt);
            if let Some(revised) = &outcome.image.revised_prompt {
                println!("Revised prompt: {}", revised);
            }
            println!("Size: {}", outcome.image_size);
            println!("Saved: {}", path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    let command = match parse_cli_args(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let vocabulary = Vocabulary::load(CONFIG.vocabulary_path.as_deref())?;
    info!("Running command {:?}", command);

    if let Err(err) = run_command(command, &vocabulary).await {
        error!("Command failed: {err:#}");
        return Err(err);
    }
    Ok(())
}
