use std::time::Duration;

use anyhow::anyhow;
use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::llm::chat::{summarize_error_body, truncate_for_log};
use crate::llm::media::{detect_mime_type, download_media};
use crate::prompt::ComposedPrompt;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, thiserror::Error)]
#[error("Image generation failed: {0}")]
pub struct ImageGenerationError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub revised_prompt: Option<String>,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>, revised_prompt: Option<String>) -> Self {
        let mime_type = detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string());
        GeneratedImage {
            bytes,
            mime_type,
            revised_prompt,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
    revised_prompt: Option<String>,
}

const IMAGE_MAX_RETRY_ATTEMPTS: usize = 2;
const IMAGE_RETRY_BASE_DELAY_MS: u64 = 900;

fn image_should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn image_should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn image_retry_delay(attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u64;
    Duration::from_millis(IMAGE_RETRY_BASE_DELAY_MS.saturating_mul(attempt))
}

fn build_image_payload(prompt: &ComposedPrompt, size: &str) -> Value {
    let size = size.trim();
    let size = if size.is_empty() {
        CONFIG.default_image_size.as_str()
    } else {
        size
    };
    json!({
        "model": CONFIG.image_model,
        "prompt": prompt.as_str(),
        "n": 1,
        "size": size,
        "quality": CONFIG.image_quality,
        "response_format": "b64_json",
    })
}

async fn call_images_api(payload: &Value) -> anyhow::Result<ImagesResponse> {
    let api_key = CONFIG.require_api_key()?;
    let client = get_http_client();
    let url = CONFIG.endpoint("images/generations");

    let mut attempt = 0usize;
    loop {
        attempt += 1;
        let response = match client.post(&url).bearer_auth(api_key).json(payload).send().await {
            Ok(response) => response,
            Err(err) => {
                let should_retry =
                    image_should_retry_error(&err) && attempt < IMAGE_MAX_RETRY_ATTEMPTS;
                warn!(
                    "Image request failed to send: {} (timeout={}, connect={}, retrying={})",
                    err,
                    err.is_timeout(),
                    err.is_connect(),
                    should_retry
                );
                if should_retry {
                    tokio::time::sleep(image_retry_delay(attempt)).await;
                    continue;
                }
                return Err(anyhow!("Image request failed: {}", err));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            let should_retry =
                image_should_retry_status(status) && attempt < IMAGE_MAX_RETRY_ATTEMPTS;
            warn!(
                "Image API error: status={}, body={}, retrying={}",
                status, body_summary, should_retry
            );
            if should_retry {
                tokio::time::sleep(image_retry_delay(attempt)).await;
                continue;
            }
            let detail = message.unwrap_or(body_summary);
            return Err(anyhow!(
                "Image request failed with status {}: {}",
                status,
                detail
            ));
        }

        let value = response.json::<ImagesResponse>().await?;
        debug!("Image response received with {} item(s)", value.data.len());
        return Ok(value);
    }
}

async fn collect_images(response: ImagesResponse) -> Vec<GeneratedImage> {
    let mut images = Vec::new();
    for item in response.data {
        let bytes = if let Some(encoded) = item.b64_json.as_deref() {
            match general_purpose::STANDARD.decode(encoded) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    warn!("Failed to decode base64 image data: {err}");
                    None
                }
            }
        } else if let Some(url) = item.url.as_deref() {
            download_media(url).await
        } else {
            None
        };

        if let Some(bytes) = bytes.filter(|bytes| !bytes.is_empty()) {
            images.push(GeneratedImage::new(bytes, item.revised_prompt));
        }
    }
    images
}

pub async fn generate_image(
    prompt: &ComposedPrompt,
    size: &str,
) -> Result<GeneratedImage, ImageGenerationError> {
    if prompt.as_str().trim().is_empty() {
        return Err(ImageGenerationError("prompt is empty".to_string()));
    }

    let payload = build_image_payload(prompt, size);
    let model = CONFIG.image_model.as_str();
    let metadata = json!({ "size": payload.get("size"), "prompt_chars": prompt.char_count() });
    debug!(
        "Image request: model={}, prompt={}",
        model,
        truncate_for_log(prompt.as_str(), 200)
    );

    let response = log_llm_timing("openai", model, "image_generation", Some(metadata), || async {
        call_images_api(&payload).await
    })
    .await
    .map_err(|err| ImageGenerationError(err.to_string()))?;

    collect_images(response)
        .await
        .into_iter()
        .next()
        .ok_or_else(|| ImageGenerationError(format!("No images returned (model: {})", model)))
}
