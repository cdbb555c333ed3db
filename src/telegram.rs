//! Chat notification delivery
//!
//! The polling loop only depends on the [`Notifier`] trait, so tests can
//! record deliveries in memory. [`TelegramNotifier`] is the production
//! implementation backed by the Telegram Bot API.

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Interface for delivering messages to the configured chat
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    /// Returns [`Error::Notification`] when delivery fails for any reason.
    async fn send(&self, text: &str) -> Result<()>;
}

/// JSON body of a sendMessage call
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// The slice of a Bot API reply the bot cares about
#[derive(Debug, Deserialize)]
struct SendMessageReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Notifier backed by the Telegram Bot API
pub struct TelegramNotifier {
    http_client: reqwest::Client,
    send_message_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier from the runtime configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("homework-bot notifier")
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        let send_message_url = format!(
            "{}/bot{}/sendMessage",
            config.telegram_api_base.trim_end_matches('/'),
            config.telegram_token
        );

        Ok(Self {
            http_client,
            send_message_url,
            chat_id: config.telegram_chat_id.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .http_client
            .post(&self.send_message_url)
            .json(&SendMessageRequest {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            // without_url keeps the bot token out of logs
            .map_err(|e| {
                Error::Notification(format!("sendMessage request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notification(format!(
                "sendMessage returned status {status}: {body}"
            )));
        }

        let reply: SendMessageReply = response.json().await.map_err(|e| {
            Error::Notification(format!("undecodable sendMessage reply: {}", e.without_url()))
        })?;
        if !reply.ok {
            return Err(Error::Notification(format!(
                "Telegram rejected the message: {}",
                reply.description.as_deref().unwrap_or("no description")
            )));
        }

        debug!(text = %text, "notification delivered");
        Ok(())
    }
}
