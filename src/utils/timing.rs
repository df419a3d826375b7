use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

pub const TIMING_TARGET: &str = "studio.timing";

const TIMER_TEXT_LIMIT: usize = 300;

#[derive(Debug)]
pub struct InteractionTimer {
    command: String,
    interaction: u64,
    text: Option<String>,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl InteractionTimer {
    pub fn new(command: &str, interaction: u64, text: Option<&str>) -> Self {
        let text = text.map(|value| {
            value
                .replace('\n', " ")
                .chars()
                .take(TIMER_TEXT_LIMIT)
                .collect::<String>()
        });

        InteractionTimer {
            command: command.to_string(),
            interaction,
            text,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn log_received(&self) {
        info!(
            target: TIMING_TARGET,
            "event=interaction_received command={} interaction={} received_at={} text={:?}",
            self.command,
            self.interaction,
            self.started_at.to_rfc3339(),
            self.text
        );
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=interaction_completed command={} interaction={} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.command,
            self.interaction,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

pub fn start_interaction_timer(command: &str, interaction: u64, text: Option<&str>) -> InteractionTimer {
    let timer = InteractionTimer::new(command, interaction, text);
    timer.log_received();
    timer
}

pub fn complete_interaction_timer(timer: &mut InteractionTimer, status: &str, detail: Option<String>) {
    timer.mark_status(status, detail);
    timer.log_completed();
}

pub async fn log_llm_timing<T, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, anyhow::Error>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: TIMING_TARGET,
        "event=llm_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} metadata={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status,
        metadata_text
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_text_is_flattened_and_capped() {
        let long = format!("첫 줄\n{}", "가".repeat(400));
        let timer = InteractionTimer::new("generate", 1, Some(&long));
        let text = timer.text.clone().unwrap();
        assert!(!text.contains('\n'));
        assert_eq!(text.chars().count(), TIMER_TEXT_LIMIT);
    }

    #[test]
    fn completion_is_logged_once() {
        let mut timer = start_interaction_timer("compose", 2, None);
        complete_interaction_timer(&mut timer, "error", Some("empty theme".to_string()));
        assert!(timer.completed);
        assert_eq!(timer.status, "error");
        timer.log_completed();
        assert!(timer.completed);
    }

    #[tokio::test]
    async fn llm_timing_passes_result_through() {
        let ok = log_llm_timing("openai", "gpt", "test", None, || async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);
        let err: Result<(), _> = log_llm_timing("openai", "gpt", "test", None, || async {
            Err(anyhow::anyhow!("boom"))
        })
        .await;
        assert_eq!(err.unwrap_err().to_string(), "boom");
    }
}
