//! Homework status polling loop
//!
//! This module provides the background loop that polls the status endpoint,
//! announces changes through the notifier and keeps itself alive across
//! failed cycles.
//!
//! # Features
//!
//! - Fixed polling interval with token-based cancellation between cycles
//! - Change deduplication against the last announced message
//! - Query window advancement driven by the server clock
//! - Per-cycle error containment with failure reports to the chat
//!
//! # Example
//!
//! ```no_run
//! use homework_bot::{Config, PracticumClient, StatusWatcher, TelegramNotifier};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let client = PracticumClient::new(&config)?;
//! let notifier = Arc::new(TelegramNotifier::new(&config)?);
//! let watcher = StatusWatcher::new(client, notifier, &config, CancellationToken::new());
//!
//! // Runs until the token is cancelled
//! tokio::spawn(async move {
//!     watcher.run().await;
//! });
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::practicum::PracticumClient;
use crate::response;
use crate::status;
use crate::telegram::Notifier;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Prefix of the chat message reporting a failed cycle
const FAILURE_PREFIX: &str = "Сбой в работе программы: ";

/// Polling loop that watches one user's homework review status
///
/// The watcher owns all loop state: the query cursor and the last announced
/// message. One cycle finishes before the next begins; the only suspension
/// point between cycles is the interval sleep, raced against the cancellation
/// token.
pub struct StatusWatcher {
    /// Client for the status endpoint
    client: PracticumClient,

    /// Delivery channel for announcements and failure reports
    notifier: Arc<dyn Notifier>,

    /// Pause between cycles
    poll_interval: Duration,

    /// Cancellation token checked after every sleep
    shutdown: CancellationToken,

    /// Lower bound of the next query window (Unix seconds)
    cursor: i64,

    /// Most recently delivered message, for deduplication
    last_announced: Option<String>,
}

impl StatusWatcher {
    /// Creates a new watcher.
    ///
    /// The query cursor starts at the current time, so only changes occurring
    /// after startup are announced.
    pub fn new(
        client: PracticumClient,
        notifier: Arc<dyn Notifier>,
        config: &Config,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            notifier,
            poll_interval: config.poll_interval,
            shutdown,
            cursor: Utc::now().timestamp(),
            last_announced: None,
        }
    }

    /// Returns a handle to the watcher's cancellation token.
    ///
    /// Cancelling it stops the loop after the cycle in flight.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Starts the polling loop.
    ///
    /// Each iteration:
    /// 1. Runs one cycle (fetch, validate, translate, announce), containing
    ///    any failure inside the cycle
    /// 2. Sleeps for the poll interval, raced against the cancellation token
    /// 3. Re-checks the token and exits if cancellation was requested
    ///
    /// A failed cycle never terminates the loop; only the token does.
    pub async fn run(mut self) {
        info!(interval = ?self.poll_interval, "status watcher started");

        loop {
            self.poll_once().await;

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = self.shutdown.cancelled() => {}
            }
            if self.shutdown.is_cancelled() {
                info!("status watcher shutting down");
                break;
            }
        }

        info!("status watcher stopped");
    }

    /// Run one cycle, reporting any failure instead of propagating it.
    async fn poll_once(&mut self) {
        if let Err(e) = self.cycle().await {
            self.report_failure(&e).await;
        }
    }

    /// One fetch-validate-translate-announce pass.
    ///
    /// The cursor only advances after everything else in the cycle has
    /// succeeded, so a failed cycle re-queries the same window.
    async fn cycle(&mut self) -> Result<()> {
        let payload = self.client.fetch(self.cursor).await?;
        let page = response::validate(payload)?;

        match page.homeworks.first() {
            Some(record) => {
                let message = status::translate(record)?;
                if self.last_announced.as_deref() == Some(message.as_str()) {
                    debug!("status unchanged, nothing to announce");
                } else {
                    self.notifier.send(&message).await?;
                    info!(message = %message, "status change announced");
                    self.last_announced = Some(message);
                }
            }
            None => debug!("no homework updates in the window"),
        }

        if let Some(server_now) = page.current_date {
            self.cursor = server_now;
        }

        Ok(())
    }

    /// Log a failed cycle and report it to the chat.
    ///
    /// Failed deliveries are logged only; reporting them through the same
    /// channel would just fail again.
    async fn report_failure(&self, error: &Error) {
        error!(error = %error, "polling cycle failed");

        if matches!(error, Error::Notification(_)) {
            return;
        }

        let report = format!("{FAILURE_PREFIX}{error}");
        if let Err(e) = self.notifier.send(&report).await {
            error!(error = %e, "failed to deliver the failure report");
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Notifier that records deliveries, optionally failing them all
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail_sends: AtomicBool,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<()> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(Error::Notification("chat unreachable".into()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn watcher_for(
        mock_server: &MockServer,
        notifier: Arc<RecordingNotifier>,
        from_date: i64,
    ) -> StatusWatcher {
        let config = Config {
            practicum_token: "t".into(),
            telegram_token: "unused".into(),
            telegram_chat_id: "unused".into(),
            endpoint: format!("{}/statuses/", mock_server.uri()),
            poll_interval: Duration::from_millis(10),
            ..Config::default()
        };
        let client = PracticumClient::new(&config).unwrap();
        let mut watcher =
            StatusWatcher::new(client, notifier, &config, CancellationToken::new());
        watcher.cursor = from_date;
        watcher
    }

    fn reviewing_proj1() -> serde_json::Value {
        json!({"homework_name": "proj1", "status": "reviewing"})
    }

    const REVIEWING_MESSAGE: &str =
        "Изменился статус проверки работы \"proj1\". Работа взята на проверку ревьюером.";
    const APPROVED_MESSAGE: &str = "Изменился статус проверки работы \"proj1\". \
                                    Работа проверена: ревьюеру всё понравилось. Ура!";

    // -----------------------------------------------------------------------
    // Single-cycle behavior
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn new_status_is_announced_and_cursor_follows_server_clock() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [reviewing_proj1()],
                "current_date": 1000,
            })))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let mut watcher = watcher_for(&mock_server, notifier.clone(), 1);

        watcher.poll_once().await;

        assert_eq!(notifier.messages(), vec![REVIEWING_MESSAGE.to_string()]);
        assert_eq!(watcher.cursor, 1000);
    }

    #[tokio::test]
    async fn unchanged_status_is_not_reannounced() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [reviewing_proj1()],
                "current_date": 1000,
            })))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let mut watcher = watcher_for(&mock_server, notifier.clone(), 1);

        watcher.poll_once().await;
        watcher.poll_once().await;
        watcher.poll_once().await;

        assert_eq!(
            notifier.messages().len(),
            1,
            "an identical status must be announced exactly once"
        );
    }

    #[tokio::test]
    async fn empty_window_stays_silent_but_advances_the_cursor() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [],
                "current_date": 500,
            })))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let mut watcher = watcher_for(&mock_server, notifier.clone(), 1);

        watcher.poll_once().await;

        assert!(notifier.messages().is_empty());
        assert_eq!(watcher.cursor, 500);
    }

    #[tokio::test]
    async fn three_cycle_scenario_announces_each_change_once() {
        let mock_server = MockServer::start().await;

        // Cycle 1: a new status with a server clock
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [reviewing_proj1()],
                "current_date": 1000,
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        // Cycle 2: the identical status, no server clock
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [reviewing_proj1()],
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        // Cycle 3: the verdict
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [{"homework_name": "proj1", "status": "approved"}],
                "current_date": 2000,
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let mut watcher = watcher_for(&mock_server, notifier.clone(), 1);

        watcher.poll_once().await;
        assert_eq!(notifier.messages().len(), 1);
        assert_eq!(watcher.cursor, 1000);

        watcher.poll_once().await;
        assert_eq!(notifier.messages().len(), 1, "no announcement for a repeat");
        assert_eq!(watcher.cursor, 1000, "cursor holds without current_date");

        watcher.poll_once().await;
        assert_eq!(
            notifier.messages(),
            vec![REVIEWING_MESSAGE.to_string(), APPROVED_MESSAGE.to_string()]
        );
        assert_eq!(watcher.cursor, 2000);
    }

    // -----------------------------------------------------------------------
    // Failure containment
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn malformed_payload_is_reported_through_the_chat() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["oops"])))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let mut watcher = watcher_for(&mock_server, notifier.clone(), 1);

        watcher.poll_once().await;

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0],
            "Сбой в работе программы: malformed response: payload is not an object"
        );
        assert_eq!(watcher.cursor, 1, "a failed cycle must not move the cursor");
    }

    #[tokio::test]
    async fn endpoint_failure_report_names_the_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let mut watcher = watcher_for(&mock_server, notifier.clone(), 1);

        watcher.poll_once().await;

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with(FAILURE_PREFIX));
        assert!(messages[0].contains("503"));
    }

    #[tokio::test]
    async fn unknown_status_keeps_the_cursor_for_a_retry() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [{"homework_name": "proj1", "status": "graded"}],
                "current_date": 999,
            })))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let mut watcher = watcher_for(&mock_server, notifier.clone(), 1);

        watcher.poll_once().await;

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("graded"));
        assert_eq!(watcher.cursor, 1);
    }

    #[tokio::test]
    async fn failed_delivery_is_swallowed_and_retried_next_cycle() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [reviewing_proj1()],
                "current_date": 1000,
            })))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        notifier.fail_sends.store(true, Ordering::SeqCst);
        let mut watcher = watcher_for(&mock_server, notifier.clone(), 1);

        // Delivery fails: no report through the same broken channel, and no
        // state advances
        watcher.poll_once().await;
        assert!(notifier.messages().is_empty());
        assert_eq!(watcher.last_announced, None);
        assert_eq!(watcher.cursor, 1);

        // Chat is back: the same change is announced on the next cycle
        notifier.fail_sends.store(false, Ordering::SeqCst);
        watcher.poll_once().await;
        assert_eq!(notifier.messages(), vec![REVIEWING_MESSAGE.to_string()]);
        assert_eq!(watcher.cursor, 1000);
    }

    // -----------------------------------------------------------------------
    // Loop lifecycle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn run_keeps_polling_until_cancelled() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [],
                "current_date": 1,
            })))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher_for(&mock_server, notifier.clone(), 1);
        let token = watcher.shutdown_token();

        let handle = tokio::spawn(async move {
            watcher.run().await;
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher must exit after cancellation")
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert!(
            requests.len() >= 2,
            "watcher should have polled repeatedly, saw {} requests",
            requests.len()
        );
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn run_exits_after_the_cycle_in_flight_when_cancelled_early() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "homeworks": [],
            })))
            .mount(&mock_server)
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher_for(&mock_server, notifier, 1);
        watcher.shutdown_token().cancel();

        let handle = tokio::spawn(async move {
            watcher.run().await;
        });

        // Cancellation is only honored between cycles, so exactly one
        // request still goes out
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher must exit without waiting for the interval")
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }
}
