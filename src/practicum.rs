//! Homework status endpoint client
//!
//! Wraps the authenticated GET against the Practicum status endpoint. The
//! client decodes the body as JSON but leaves shape checks to
//! [`crate::response`], so transport failures and payload violations stay
//! distinct in the error taxonomy.

use crate::config::Config;
use crate::error::{Error, RequestContext, Result};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// Query parameters of a status request
#[derive(Clone, Copy, Debug, Serialize)]
struct StatusQuery {
    /// Lower bound of the reported window (Unix seconds)
    from_date: i64,
}

/// Client for the homework status endpoint
///
/// Holds one configured `reqwest::Client` for the lifetime of the bot.
#[derive(Clone, Debug)]
pub struct PracticumClient {
    http_client: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl PracticumClient {
    /// Create a new client from the runtime configuration.
    ///
    /// # Errors
    /// Returns an error if the endpoint URL does not parse or the HTTP client
    /// cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| Error::Config {
            message: format!("invalid endpoint URL {:?}: {e}", config.endpoint),
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("homework-bot status poller")
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            endpoint,
            token: config.practicum_token.clone(),
        })
    }

    /// Fetch statuses changed since `from_date`.
    ///
    /// Returns the decoded payload without shape checks.
    ///
    /// # Errors
    /// - [`Error::Connection`] when the endpoint cannot be reached
    /// - [`Error::Endpoint`] when it answers with anything but 200
    /// - [`Error::Format`] when the body does not decode as JSON
    pub async fn fetch(&self, from_date: i64) -> Result<serde_json::Value> {
        debug!(endpoint = %self.endpoint, from_date = from_date, "requesting homework statuses");

        let context = RequestContext {
            url: self.endpoint.clone(),
            from_date,
        };

        let response = self
            .http_client
            .get(self.endpoint.clone())
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&StatusQuery { from_date })
            .send()
            .await
            .map_err(|source| Error::Connection {
                context: context.clone(),
                source,
            })?;

        // Strictly 200, not any 2xx
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Endpoint { status, context });
        }

        response.json().await.map_err(Error::Format)
    }
}
