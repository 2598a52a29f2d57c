//! Discord-style webhook notifications.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, ProviderOutcome};
use crate::notify::OutcomeSink;

/// Discord rejects message content above this many characters.
const MAX_CONTENT_CHARS: usize = 2000;
const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// Posts changed and failed providers to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// `None` when no webhook URL is configured.
    pub fn from_config(config: &Config, client: Client) -> Option<Self> {
        config.webhook_url().map(|url| Self::new(client, url))
    }

    /// Message text for an outcome; unchanged providers are not announced.
    pub fn message(provider: &str, outcome: &ProviderOutcome) -> Option<String> {
        let content = match outcome {
            ProviderOutcome::Changed { detail, .. } => {
                format!("Changes detected for {provider}: {detail}")
            }
            ProviderOutcome::Error { detail, .. } => format!("Errors for {provider}: {detail}"),
            ProviderOutcome::Unchanged { .. } => return None,
        };
        Some(truncate(content, MAX_CONTENT_CHARS))
    }
}

#[async_trait]
impl OutcomeSink for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn record(&self, provider: &str, outcome: &ProviderOutcome) -> Result<()> {
        let Some(content) = Self::message(provider, outcome) else {
            return Ok(());
        };

        log::debug!("Posting {provider} outcome to webhook");
        let response = self
            .client
            .post(&self.url)
            .timeout(TIMEOUT)
            .json(&WebhookMessage { content: &content })
            .send()
            .await
            .map_err(AppError::notify)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!("webhook returned {status}: {body}")));
        }
        Ok(())
    }
}

/// Cut to at most `max` characters, marking the cut with `…`.
fn truncate(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            WebhookNotifier::message("Acme", &ProviderOutcome::changed("report")).as_deref(),
            Some("Changes detected for Acme: report")
        );
        assert_eq!(
            WebhookNotifier::message("Acme", &ProviderOutcome::error("[parse] x")).as_deref(),
            Some("Errors for Acme: [parse] x")
        );
        assert!(WebhookNotifier::message("Acme", &ProviderOutcome::unchanged(true)).is_none());
    }

    #[test]
    fn test_long_message_is_truncated() {
        let report = "é".repeat(3000);
        let message = WebhookNotifier::message("Acme", &ProviderOutcome::changed(report)).unwrap();
        assert_eq!(message.chars().count(), MAX_CONTENT_CHARS);
        assert!(message.ends_with('…'));
    }

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate("hello".into(), 5), "hello");
        assert_eq!(truncate("hello!".into(), 5), "hell…");
    }

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_string(&WebhookMessage { content: "hi" }).unwrap();
        assert_eq!(json, r#"{"content":"hi"}"#);
    }

    #[test]
    fn test_from_config_without_url() {
        let mut config = Config::default();
        config.notify.webhook_env = "AREAWATCH_TEST_UNSET_WEBHOOK".into();
        assert!(WebhookNotifier::from_config(&config, Client::new()).is_none());

        config.notify.webhook_url = Some("https://discord.example/api/webhooks/1".into());
        assert!(WebhookNotifier::from_config(&config, Client::new()).is_some());
    }
}
