//! # homework-bot
//!
//! Telegram bot that polls Yandex Practicum for homework review status
//! changes and announces them in a chat.
//!
//! ## Design Philosophy
//!
//! homework-bot is designed to be:
//! - **Single-user** - One token pair, one homework stream, one chat
//! - **Fail-alive** - A broken cycle is logged, reported and retried; only a
//!   broken configuration stops the process
//! - **Library-first** - The binary only wires the environment to the
//!   components; everything is embeddable and testable
//! - **Seam-friendly** - Delivery goes through a trait, so tests run without
//!   a network
//!
//! ## Quick Start
//!
//! ```no_run
//! use homework_bot::{
//!     Config, PracticumClient, StatusWatcher, TelegramNotifier, run_with_shutdown,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = PracticumClient::new(&config)?;
//!     let notifier = Arc::new(TelegramNotifier::new(&config)?);
//!     let watcher = StatusWatcher::new(client, notifier, &config, CancellationToken::new());
//!
//!     // Polls until SIGTERM/SIGINT
//!     run_with_shutdown(watcher).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration loading and validation
pub mod config;
/// Error types
pub mod error;
/// Homework status endpoint client
pub mod practicum;
/// Response shape validation
pub mod response;
/// Status-to-message translation
pub mod status;
/// Chat notification delivery
pub mod telegram;
/// The polling loop
pub mod watcher;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, RequestContext, Result, ValidationError};
pub use practicum::PracticumClient;
pub use response::StatusPage;
pub use status::{Homework, ReviewStatus};
pub use telegram::{Notifier, TelegramNotifier};
pub use watcher::StatusWatcher;

/// Helper function to run the watcher with graceful signal handling.
///
/// Spawns the polling loop, waits for a termination signal, cancels the
/// watcher's token and waits for the loop to finish its cycle in flight.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use homework_bot::{
///     Config, PracticumClient, StatusWatcher, TelegramNotifier, run_with_shutdown,
/// };
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env()?;
///     let client = PracticumClient::new(&config)?;
///     let notifier = Arc::new(TelegramNotifier::new(&config)?);
///     let watcher = StatusWatcher::new(client, notifier, &config, CancellationToken::new());
///
///     run_with_shutdown(watcher).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(watcher: StatusWatcher) -> Result<()> {
    let shutdown = watcher.shutdown_token();
    let task = tokio::spawn(watcher.run());

    wait_for_signal().await;
    shutdown.cancel();

    if let Err(e) = task.await {
        tracing::error!(error = %e, "watcher task did not shut down cleanly");
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM");
                }
                _ = sigint.recv() => {
                    tracing::info!("received SIGINT (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("received SIGINT (Ctrl+C)");
            } else {
                tracing::error!("could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("received SIGTERM");
            } else {
                tracing::error!("could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("received Ctrl+C");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
    }
}
