//! Error types for homework-bot
//!
//! This module provides the error taxonomy for the crate, including:
//! - Startup configuration errors (fatal, never retried)
//! - Per-cycle polling errors (transport, HTTP status, body decoding, shape)
//! - Notification delivery errors (logged, never re-notified)
//! - Request context carried inside errors for diagnostics, with the
//!   authorization token redacted

use std::fmt;
use thiserror::Error;
use url::Url;

/// Result type alias for homework-bot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for homework-bot
///
/// This is the primary error type used throughout the crate. Each variant
/// includes contextual information to help diagnose issues. Only `Config`
/// terminates the process; everything else is contained at the polling loop
/// boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error naming every missing or empty setting
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable message listing the offending variables
        message: String,
    },

    /// Transport-level failure reaching the status endpoint
    #[error("endpoint unreachable: {source}, {context}")]
    Connection {
        /// Snapshot of the request that failed
        context: RequestContext,
        /// The underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The status endpoint answered with something other than 200
    #[error("endpoint returned status {status}, {context}")]
    Endpoint {
        /// The HTTP status code observed
        status: reqwest::StatusCode,
        /// Snapshot of the request that failed
        context: RequestContext,
    },

    /// The response body could not be decoded as JSON
    #[error("undecodable response body: {0}")]
    Format(#[source] reqwest::Error),

    /// The decoded payload violates the expected shape
    #[error("malformed response: {0}")]
    Validation(#[from] ValidationError),

    /// Chat delivery failed
    #[error("notification delivery failed: {0}")]
    Notification(String),
}

/// Response shape violations detected after decoding
///
/// Split from [`Error`] so validation code can stay independent of the
/// transport layer. Converted via `#[from]` at the call sites.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Top-level payload is not a JSON object
    #[error("payload is not an object")]
    PayloadNotObject,

    /// The payload has no `homeworks` key
    #[error("payload has no homeworks key")]
    HomeworksMissing,

    /// The `homeworks` value is not an array
    #[error("homeworks is not an array")]
    HomeworksNotArray,

    /// A homework record has no usable `homework_name`
    #[error("homework record has no homework_name")]
    NameMissing,

    /// A homework record has no usable `status`
    #[error("homework record has no status")]
    StatusMissing,

    /// A homework record carries a status outside the known set
    #[error("unknown homework status: {0:?}")]
    UnknownStatus(String),
}

/// Diagnostic snapshot of a status request
///
/// Rendered into [`Error::Connection`] and [`Error::Endpoint`] messages so
/// operators can see which call failed. The authorization header is shown
/// redacted; the token itself is never stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// The URL the request was sent to
    pub url: Url,
    /// The lower bound of the queried window (Unix seconds)
    pub from_date: i64,
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url: {}, headers: {{Authorization: OAuth ***}}, params: {{from_date: {}}}",
            self.url, self.from_date
        )
    }
}
