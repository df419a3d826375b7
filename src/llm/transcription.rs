use std::path::Path;

use anyhow::{anyhow, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::llm::chat::summarize_error_body;
use crate::llm::media::{detect_mime_type, extension_for_mime, mime_for_extension};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

/// A recorded voice clip to turn into a theme.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioClip {
    pub fn from_bytes(bytes: Vec<u8>, file_name: Option<&str>) -> Self {
        let extension_mime = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(mime_for_extension);
        let mime_type = detect_mime_type(&bytes)
            .or_else(|| extension_mime.map(str::to_string))
            .unwrap_or_else(|| "audio/wav".to_string());
        let file_name = file_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("voice.{}", extension_for_mime(&mime_type)));
        AudioClip {
            bytes,
            file_name,
            mime_type,
        }
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| anyhow!("Failed to read audio file '{}': {}", path.display(), err))?;
        if bytes.is_empty() {
            return Err(anyhow!("Audio file '{}' is empty", path.display()));
        }
        let file_name = path.file_name().and_then(|name| name.to_str());
        Ok(AudioClip::from_bytes(bytes, file_name))
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

fn build_form(clip: &AudioClip) -> Result<Form> {
    let file_part = Part::bytes(clip.bytes.clone())
        .file_name(clip.file_name.clone())
        .mime_str(&clip.mime_type)
        .map_err(|err| anyhow!("Invalid audio MIME type '{}': {}", clip.mime_type, err))?;

    let mut form = Form::new()
        .part("file", file_part)
        .text("model", CONFIG.stt_model.clone())
        .text("response_format", "json");

    let language = CONFIG.stt_language.as_str();
    if language != "auto" && !language.is_empty() {
        form = form.text("language", language.to_string());
    }
    Ok(form)
}

pub async fn transcribe_audio(clip: &AudioClip) -> Result<String> {
    let api_key = CONFIG.require_api_key()?;
    let model = CONFIG.stt_model.as_str();
    let metadata = json!({ "bytes": clip.bytes.len(), "mime_type": clip.mime_type });

    log_llm_timing("openai", model, "transcription", Some(metadata), || async {
        let form = build_form(clip)?;
        let response = get_http_client()
            .post(CONFIG.endpoint("audio/transcriptions"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!(
                "Transcription API error: status={}, body={}",
                status, body_summary
            );
            return Err(anyhow!(
                "Transcription request failed with status {}: {}",
                status,
                message.unwrap_or(body_summary)
            ));
        }

        let result = response.json::<TranscriptionResponse>().await?;
        let text = result.text.trim().to_string();
        debug!("Transcription result: {} chars", text.chars().count());
        if text.is_empty() {
            return Err(anyhow!("No speech was recognized in {}", clip.file_name));
        }
        Ok(text)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_mime_falls_back_to_extension() {
        let clip = AudioClip::from_bytes(vec![1, 2, 3], Some("memo.m4a"));
        assert_eq!(clip.mime_type, "audio/mp4");
        assert_eq!(clip.file_name, "memo.m4a");
    }

    #[test]
    fn clip_without_hints_is_wav() {
        let clip = AudioClip::from_bytes(vec![0; 4], None);
        assert_eq!(clip.mime_type, "audio/wav");
        assert_eq!(clip.file_name, "voice.wav");
    }

    #[test]
    fn sniffed_bytes_win_over_extension() {
        let mut wav = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
        wav.extend_from_slice(&[0; 16]);
        let clip = AudioClip::from_bytes(wav, Some("clip.mp3"));
        assert!(clip.mime_type.contains("wav"));
    }

    #[tokio::test]
    async fn reading_missing_file_fails() {
        let path = std::env::temp_dir().join("theme_canvas_missing_clip.wav");
        assert!(AudioClip::read(&path).await.is_err());
    }
}
