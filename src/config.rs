use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub chat_temperature: f32,
    pub image_model: String,
    pub image_quality: String,
    pub default_image_size: String,
    pub stt_model: String,
    pub stt_language: String,
    pub request_timeout_seconds: u64,
    pub output_dir: PathBuf,
    pub vocabulary_path: Option<PathBuf>,
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_optional_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn normalize_image_size(value: String) -> String {
    let trimmed = value.trim();
    let valid = trimmed
        .split_once('x')
        .map(|(width, height)| width.parse::<u32>().is_ok() && height.parse::<u32>().is_ok())
        .unwrap_or(false);
    if valid {
        return trimmed.to_string();
    }
    warn!(
        "Unknown DEFAULT_IMAGE_SIZE value '{}'; defaulting to 1024x1024.",
        value
    );
    "1024x1024".to_string()
}

fn normalize_temperature(value: f32) -> f32 {
    if (0.0..=2.0).contains(&value) {
        return value;
    }
    warn!("CHAT_TEMPERATURE {} is out of range; clamping to [0, 2].", value);
    value.clamp(0.0, 2.0)
}

impl Config {
    pub fn load() -> Self {
        Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: PathBuf::from(env_string("LOG_DIR", "logs")),
            openai_api_key: env_string("OPENAI_API_KEY", "").trim().to_string(),
            openai_base_url: env_string("OPENAI_BASE_URL", "https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            chat_model: env_string("CHAT_MODEL", "gpt-4o-mini"),
            chat_temperature: normalize_temperature(env_f32("CHAT_TEMPERATURE", 0.8)),
            image_model: env_string("IMAGE_MODEL", "dall-e-3"),
            image_quality: env_string("IMAGE_QUALITY", "standard"),
            default_image_size: normalize_image_size(env_string("DEFAULT_IMAGE_SIZE", "1024x1024")),
            stt_model: env_string("STT_MODEL", "whisper-1"),
            stt_language: env_string("STT_LANGUAGE", "ko").trim().to_lowercase(),
            request_timeout_seconds: env_u64("REQUEST_TIMEOUT_SECONDS", 90).max(1),
            output_dir: PathBuf::from(env_string("OUTPUT_DIR", "outputs")),
            vocabulary_path: env_optional_path("VOCABULARY_PATH"),
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        if self.openai_api_key.is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is required for this command"));
        }
        Ok(&self.openai_api_key)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.openai_base_url, path.trim_start_matches('/'))
    }
}
