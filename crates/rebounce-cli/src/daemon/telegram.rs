//! Telegram delivery of the completion notice.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use rebounce_core::CompletionSink;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";
/// Default timeout for Telegram API calls (seconds)
const API_TIMEOUT_SECS: u64 = 30;

pub struct TelegramSink {
    client: Client,
    bot_token: String,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramSink {
    /// Create with just bot token
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            bot_token: bot_token.into(),
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}{}/{}", TELEGRAM_API_BASE, self.bot_token, method)
    }
}

#[async_trait]
impl CompletionSink for TelegramSink {
    async fn send_text(&self, session: &str, text: &str) -> Result<()> {
        let url = self.api_url("sendMessage");
        let params = serde_json::json!({
            "chat_id": session,
            "text": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&params)
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Telegram API returned {}", response.status()));
        }

        let api_response: TelegramResponse = response.json().await?;
        if !api_response.ok {
            return Err(anyhow!(
                "Telegram API error: {}",
                api_response.description.unwrap_or_default()
            ));
        }

        debug!(session, "completion notice delivered via Telegram");
        Ok(())
    }
}

/// Fallback sink when no bot token is configured: the notice goes to the log.
pub struct LogSink;

#[async_trait]
impl CompletionSink for LogSink {
    async fn send_text(&self, session: &str, text: &str) -> Result<()> {
        info!(session, text, "restart completion notice");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_api_url_from_token() {
        let sink = TelegramSink::with_token("123:ABC");
        assert_eq!(
            sink.api_url("sendMessage"),
            "https://api.telegram.org/bot123:ABC/sendMessage"
        );
    }

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        let sink = LogSink;
        sink.send_text("sessA", "Restart complete in 7.30 seconds")
            .await
            .unwrap();
    }
}
