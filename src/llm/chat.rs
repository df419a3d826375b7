use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

pub(crate) fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_payload(payload: &Value) -> String {
    let model = payload
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let message_count = payload
        .get("messages")
        .and_then(|v| v.as_array())
        .map(|messages| messages.len())
        .unwrap_or(0);
    let user_chars = payload
        .pointer("/messages/1/content")
        .and_then(|v| v.as_str())
        .map(|content| content.chars().count())
        .unwrap_or(0);

    format!(
        "model={}, messages={}, user_chars={}",
        model, message_count, user_chars
    )
}

/// Pulls the provider's message out of an error body, plus a log-safe summary.
pub(crate) fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn extract_message_content(response: &Value) -> String {
    let message = response
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"));

    // Reasoning text is never a usable answer; an empty content stays empty.
    message
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

async fn call_chat_api(payload: &Value) -> Result<Value> {
    debug!("Chat completion request: {}", summarize_payload(payload));

    let api_key = CONFIG.require_api_key()?;
    let client = get_http_client();
    let response = client
        .post(CONFIG.endpoint("chat/completions"))
        .bearer_auth(api_key)
        .json(payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let (message, body_summary) = summarize_error_body(&body);
        warn!(
            "Chat completion API error: status={}, body={}",
            status, body_summary
        );
        let detail = message.unwrap_or(body_summary);
        return Err(anyhow!(
            "Chat completion request failed with status {}: {}",
            status,
            detail
        ));
    }

    let value = response.json::<Value>().await?;
    debug!(
        "Chat completion response received for model={}",
        payload
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
    );
    Ok(value)
}

pub async fn call_chat_completion(
    system_prompt: &str,
    user_content: &str,
    operation: &str,
) -> Result<String> {
    let model = CONFIG.chat_model.as_str();
    if model.trim().is_empty() {
        return Err(anyhow!("CHAT_MODEL is empty"));
    }

    let payload = json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_content },
        ],
        "temperature": CONFIG.chat_temperature,
    });

    let operation = format!("chat:{}", operation);
    log_llm_timing("openai", model, &operation, None, || async {
        let response = call_chat_api(&payload).await?;
        let content = extract_message_content(&response);
        if content.is_empty() {
            warn!(
                "Chat completion returned empty content: {}",
                truncate_for_log(&response.to_string(), 2000)
            );
        }
        Ok(content)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_prefers_provider_message() {
        let (message, summary) =
            summarize_error_body(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#);
        assert_eq!(message.as_deref(), Some("Incorrect API key provided"));
        assert!(summary.contains("invalid_request_error"));

        let (message, summary) = summarize_error_body("  ");
        assert!(message.is_none());
        assert_eq!(summary, "empty response body");

        let (message, summary) = summarize_error_body("<html>Bad Gateway</html>");
        assert!(message.is_none());
        assert_eq!(summary, "<html>Bad Gateway</html>");
    }

    #[test]
    fn extracts_content_only() {
        let response = json!({ "choices": [{ "message": { "content": "  Style: 유화  " } }] });
        assert_eq!(extract_message_content(&response), "Style: 유화");

        let response = json!({ "choices": [{ "message": {
            "content": "",
            "reasoning": "The user wants a lighthouse; I should think about lighting first."
        } }] });
        let content = extract_message_content(&response);
        assert_eq!(content, "");
        assert!(crate::prompt::clean_refined_prompt(&content).is_none());

        assert_eq!(extract_message_content(&json!({})), "");
    }

    #[test]
    fn payload_summary_counts_user_chars() {
        let payload = json!({
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": "sys" },
                { "role": "user", "content": "고양이" },
            ],
        });
        assert_eq!(
            summarize_payload(&payload),
            "model=gpt-4o-mini, messages=2, user_chars=3"
        );
    }

    #[test]
    fn log_truncation_marks_cut_text() {
        assert_eq!(truncate_for_log("abcdef", 3), "abc... (truncated)");
        assert_eq!(truncate_for_log("abc", 3), "abc");
    }
}
