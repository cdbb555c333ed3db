//! Configuration for homework-bot

use crate::error::{Error, Result};
use std::env;
use std::time::Duration;
use url::Url;

/// Environment variable holding the Practicum API token
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";

/// Environment variable holding the Telegram bot token
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the destination chat id
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Runtime configuration for the bot
///
/// Credentials come from the environment. The remaining fields have fixed
/// defaults matching the production Practicum and Telegram endpoints; tests
/// override them directly.
#[derive(Clone, Debug)]
pub struct Config {
    /// OAuth token for the homework status API
    pub practicum_token: String,

    /// Telegram bot token
    pub telegram_token: String,

    /// Destination chat id (numeric id or @channel name, passed through as-is)
    pub telegram_chat_id: String,

    /// Homework status endpoint URL (default: the production Practicum endpoint)
    pub endpoint: String,

    /// Telegram Bot API base URL (default: "https://api.telegram.org")
    pub telegram_api_base: String,

    /// Pause between polling cycles (default: 600s)
    pub poll_interval: Duration,

    /// Per-request timeout for both HTTP clients (default: 30s)
    pub request_timeout: Duration,
}

impl Config {
    /// Build a config from the process environment.
    ///
    /// Reads the three credential variables and validates the result. Every
    /// missing or empty variable is reported in a single error so a broken
    /// deployment shows all problems at once.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            practicum_token: env::var(PRACTICUM_TOKEN_VAR).unwrap_or_default(),
            telegram_token: env::var(TELEGRAM_TOKEN_VAR).unwrap_or_default(),
            telegram_chat_id: env::var(TELEGRAM_CHAT_ID_VAR).unwrap_or_default(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every credential is present and both URLs parse.
    ///
    /// Runs once at startup, before any network call.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        for (name, value) in [
            (PRACTICUM_TOKEN_VAR, &self.practicum_token),
            (TELEGRAM_TOKEN_VAR, &self.telegram_token),
            (TELEGRAM_CHAT_ID_VAR, &self.telegram_chat_id),
        ] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(Error::Config {
                message: format!(
                    "missing required environment variables: {}",
                    missing.join(", ")
                ),
            });
        }

        Url::parse(&self.endpoint).map_err(|e| Error::Config {
            message: format!("invalid endpoint URL {:?}: {e}", self.endpoint),
        })?;
        Url::parse(&self.telegram_api_base).map_err(|e| Error::Config {
            message: format!(
                "invalid Telegram API base URL {:?}: {e}",
                self.telegram_api_base
            ),
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            practicum_token: String::new(),
            telegram_token: String::new(),
            telegram_chat_id: String::new(),
            endpoint: default_endpoint(),
            telegram_api_base: default_telegram_api_base(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "https://practicum.yandex.ru/api/user_api/homework_statuses/".to_string()
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(600)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}
