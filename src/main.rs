//! Daemon entry point for homework-bot
//!
//! Wires the process environment to the library components and runs the
//! polling loop until a termination signal arrives. Configuration problems
//! are fatal here; everything later is handled inside the loop.

use homework_bot::{
    Config, PracticumClient, Result, StatusWatcher, TelegramNotifier, run_with_shutdown,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // A .env file is optional; credentials may come from the real environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "refusing to start");
            return ExitCode::FAILURE;
        }
    };

    let watcher = match build_watcher(&config) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!(error = %e, "refusing to start");
            return ExitCode::FAILURE;
        }
    };

    info!(endpoint = %config.endpoint, "homework-bot starting");
    if let Err(e) = run_with_shutdown(watcher).await {
        error!(error = %e, "homework-bot exited with an error");
        return ExitCode::FAILURE;
    }

    info!("homework-bot stopped");
    ExitCode::SUCCESS
}

fn build_watcher(config: &Config) -> Result<StatusWatcher> {
    let client = PracticumClient::new(config)?;
    let notifier = Arc::new(TelegramNotifier::new(config)?);
    Ok(StatusWatcher::new(
        client,
        notifier,
        config,
        CancellationToken::new(),
    ))
}
