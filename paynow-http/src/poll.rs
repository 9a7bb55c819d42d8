//! Polling a transaction until it settles.
//!
//! [`Poller`] checks a poll URL on a fixed interval until the transaction is
//! `Paid` or `Cancelled`. Three bounds stop it early:
//!
//! - **Attempts**: after `max_attempts` non-terminal readings the outcome is
//!   [`PollOutcome::Exhausted`].
//! - **Deadline**: `max_attempts × interval + grace` of wall-clock time, which
//!   also cuts off a status request that never returns. The grace is never
//!   shorter than one interval, so the last attempt always has time to answer.
//! - **Cancellation**: a [`CancellationToken`] supplied by the caller.
//!
//! A failed status request ends the session immediately with
//! [`PollOutcome::Failed`] instead of being retried, so a broken network is
//! never mistaken for a pending payment.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use paynow::{StatusSnapshot, TransactionStatus};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::constants::{DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_GRACE, DEFAULT_POLL_INTERVAL};
use crate::error::ClientError;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can read a transaction's status from its poll URL.
///
/// Implemented by [`PaynowClient`](crate::PaynowClient).
pub trait StatusSource: Send + Sync {
    /// Fetches one status snapshot.
    fn fetch_status<'a>(
        &'a self,
        poll_url: &'a str,
    ) -> BoxFuture<'a, Result<StatusSnapshot, ClientError>>;
}

/// Polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Spacing between attempts. The first attempt happens after one interval.
    pub interval: Duration,
    /// Number of attempts before giving up.
    pub max_attempts: u32,
    /// Slack added to `max_attempts × interval` for the overall deadline.
    /// Values below `interval` are raised to `interval`.
    pub grace: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_ATTEMPTS,
            grace: DEFAULT_POLL_GRACE,
        }
    }
}

impl PollConfig {
    /// Creates a schedule with the default grace period.
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            interval,
            max_attempts,
            grace: DEFAULT_POLL_GRACE,
        }
    }

    /// Sets the grace period added to the deadline.
    ///
    /// The effective grace is at least one interval; see [`PollConfig::deadline`].
    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Total wall-clock budget for a poll session.
    ///
    /// The last tick lands at `max_attempts × interval`, so the grace is
    /// floored at one interval to leave that attempt room to complete.
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.interval
            .saturating_mul(self.max_attempts)
            .saturating_add(self.grace.max(self.interval))
    }
}

/// How a poll session ended.
#[derive(Debug)]
pub enum PollOutcome {
    /// The transaction was paid.
    Paid(StatusSnapshot),
    /// The transaction was cancelled.
    Cancelled(StatusSnapshot),
    /// Every attempt returned a non-terminal status.
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// The last status read, if any.
        last: Option<StatusSnapshot>,
    },
    /// A status request failed.
    Failed {
        /// Attempts made, including the failed one.
        attempts: u32,
        /// The failure.
        error: ClientError,
    },
    /// The overall deadline elapsed.
    TimedOut {
        /// Attempts started before the deadline.
        attempts: u32,
        /// The deadline that elapsed.
        deadline: Duration,
    },
    /// The caller cancelled the session.
    Aborted {
        /// Attempts started before cancellation.
        attempts: u32,
    },
}

impl PollOutcome {
    /// Returns `true` if polling ended without a hard error: the transaction
    /// was paid or cancelled, or attempts ran out.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(
            self,
            Self::Paid(_) | Self::Cancelled(_) | Self::Exhausted { .. }
        )
    }

    /// Returns the last status snapshot read, if any.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&StatusSnapshot> {
        match self {
            Self::Paid(snapshot) | Self::Cancelled(snapshot) => Some(snapshot),
            Self::Exhausted { last, .. } => last.as_ref(),
            _ => None,
        }
    }

    /// Human-readable description of the outcome.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Splits the outcome into `(completed, message)`.
    #[must_use]
    pub fn into_parts(self) -> (bool, String) {
        (self.is_completed(), self.message())
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paid(snapshot) | Self::Cancelled(snapshot) => f.write_str(snapshot.status.as_str()),
            Self::Exhausted { attempts, .. } => write!(
                f,
                "Maximum attempts reached without payment confirmation after {attempts} attempts"
            ),
            Self::Failed { error, .. } => write!(f, "Error fetching payment status: {error}"),
            Self::TimedOut { attempts, deadline } => write!(
                f,
                "Polling deadline of {}s elapsed after {attempts} attempts",
                deadline.as_secs_f64()
            ),
            Self::Aborted { attempts } => {
                write!(f, "Polling cancelled after {attempts} attempts")
            }
        }
    }
}

/// Polls a [`StatusSource`] on a [`PollConfig`] schedule.
#[derive(Debug)]
pub struct Poller<'a, S: ?Sized> {
    source: &'a S,
    config: PollConfig,
}

impl<'a, S: StatusSource + ?Sized> Poller<'a, S> {
    /// Creates a poller reading from `source`.
    pub const fn new(source: &'a S, config: PollConfig) -> Self {
        Self { source, config }
    }

    /// Returns the polling schedule.
    #[must_use]
    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Polls `poll_url` until a terminal status, exhaustion, a failed request,
    /// the deadline, or cancellation.
    pub async fn poll(&self, poll_url: &str, cancel: &CancellationToken) -> PollOutcome {
        let config = self.config;
        let deadline = config.deadline();
        let expires = tokio::time::sleep(deadline);
        tokio::pin!(expires);

        // `interval_at` rejects a zero period.
        let period = config.interval.max(Duration::from_millis(1));
        let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts = 0;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return PollOutcome::Aborted { attempts },
                () = &mut expires => return PollOutcome::TimedOut { attempts, deadline },
                _ = ticks.tick() => {}
            }

            attempts += 1;
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => return PollOutcome::Aborted { attempts },
                () = &mut expires => return PollOutcome::TimedOut { attempts, deadline },
                fetched = self.source.fetch_status(poll_url) => fetched,
            };

            let snapshot = match fetched {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!(attempts, %error, "Paynow status check failed");
                    return PollOutcome::Failed { attempts, error };
                }
            };

            #[cfg(feature = "telemetry")]
            tracing::debug!(attempts, status = %snapshot.status, "Checked Paynow payment status");

            if snapshot.status.is_terminal() {
                return if snapshot.status == TransactionStatus::Paid {
                    PollOutcome::Paid(snapshot)
                } else {
                    PollOutcome::Cancelled(snapshot)
                };
            }
            if attempts >= config.max_attempts {
                return PollOutcome::Exhausted {
                    attempts,
                    last: Some(snapshot),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PaynowClient;
    use paynow::Integration;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const INTERVAL: Duration = Duration::from_millis(40);

    fn snapshot(status: &str) -> StatusSnapshot {
        StatusSnapshot::parse(&format!("reference=INV-1&status={status}"))
    }

    /// Replays scripted statuses, repeating the last one.
    struct Scripted {
        statuses: Mutex<VecDeque<&'static str>>,
        calls: AtomicU32,
        started: Instant,
        call_times: Mutex<Vec<Duration>>,
    }

    impl Scripted {
        fn new(statuses: &[&'static str]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                calls: AtomicU32::new(0),
                started: Instant::now(),
                call_times: Mutex::new(Vec::new()),
            }
        }
    }

    impl StatusSource for Scripted {
        fn fetch_status<'a>(
            &'a self,
            _poll_url: &'a str,
        ) -> BoxFuture<'a, Result<StatusSnapshot, ClientError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times
                .lock()
                .unwrap()
                .push(self.started.elapsed());
            let mut statuses = self.statuses.lock().unwrap();
            let status = if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses[0]
            };
            Box::pin(async move { Ok(snapshot(status)) })
        }
    }

    /// Never answers.
    struct Stalled;

    impl StatusSource for Stalled {
        fn fetch_status<'a>(
            &'a self,
            _poll_url: &'a str,
        ) -> BoxFuture<'a, Result<StatusSnapshot, ClientError>> {
            Box::pin(std::future::pending())
        }
    }

    #[test]
    fn test_deadline_is_attempts_times_interval_plus_grace() {
        let config = PollConfig::new(3, Duration::from_secs(15));
        assert_eq!(config.deadline(), Duration::from_secs(55));
        let config = config.with_grace(Duration::from_secs(20));
        assert_eq!(config.deadline(), Duration::from_secs(65));
    }

    #[test]
    fn test_grace_is_at_least_one_interval() {
        let config = PollConfig::new(3, Duration::from_secs(15)).with_grace(Duration::ZERO);
        assert_eq!(config.grace, Duration::ZERO);
        assert_eq!(config.deadline(), Duration::from_secs(60));
    }

    #[test]
    fn test_completed_outcomes() {
        assert!(PollOutcome::Paid(snapshot("Paid")).is_completed());
        assert!(PollOutcome::Cancelled(snapshot("Cancelled")).is_completed());
        assert!(
            PollOutcome::Exhausted {
                attempts: 3,
                last: None
            }
            .is_completed()
        );
        assert!(!PollOutcome::Aborted { attempts: 0 }.is_completed());
        assert!(
            !PollOutcome::TimedOut {
                attempts: 1,
                deadline: Duration::from_secs(1)
            }
            .is_completed()
        );
    }

    #[tokio::test]
    async fn test_stops_at_first_terminal_status() {
        let source = Scripted::new(&["Sent", "Sent", "Cancelled", "Paid"]);
        let outcome = Poller::new(&source, PollConfig::new(10, INTERVAL))
            .poll("http://poll", &CancellationToken::new())
            .await;
        assert!(matches!(outcome, PollOutcome::Cancelled(_)));
        assert_eq!(outcome.message(), "Cancelled");
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_first_attempt_waits_one_interval_and_ticks_are_spaced() {
        let source = Scripted::new(&["Sent"]);
        let outcome = Poller::new(&source, PollConfig::new(3, INTERVAL))
            .poll("http://poll", &CancellationToken::new())
            .await;
        assert!(matches!(outcome, PollOutcome::Exhausted { attempts: 3, .. }));

        let times = source.call_times.lock().unwrap().clone();
        assert_eq!(times.len(), 3);
        assert!(times[0] >= INTERVAL, "first attempt after {:?}", times[0]);
        for pair in times.windows(2) {
            assert!(pair[1] >= pair[0] + INTERVAL / 2);
        }
    }

    #[tokio::test]
    async fn test_deadline_cuts_off_stalled_request() {
        let config = PollConfig::new(2, INTERVAL).with_grace(Duration::from_millis(20));
        let outcome = Poller::new(&Stalled, config)
            .poll("http://poll", &CancellationToken::new())
            .await;
        assert!(
            matches!(outcome, PollOutcome::TimedOut { attempts: 1, .. }),
            "{outcome}"
        );
        assert!(!outcome.is_completed());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_polling() {
        let source = Scripted::new(&["Sent"]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(INTERVAL * 2 + INTERVAL / 2).await;
            trigger.cancel();
        });

        let outcome = Poller::new(&source, PollConfig::new(100, INTERVAL))
            .poll("http://poll", &cancel)
            .await;
        let PollOutcome::Aborted { attempts } = outcome else {
            panic!("expected abort, got {outcome}");
        };
        assert!((1..100).contains(&attempts));
        assert!(!outcome.is_completed());
    }

    #[tokio::test]
    async fn test_already_cancelled_token_makes_no_requests() {
        let source = Scripted::new(&["Paid"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = Poller::new(&source, PollConfig::new(3, INTERVAL))
            .poll("http://poll", &cancel)
            .await;
        assert!(matches!(outcome, PollOutcome::Aborted { attempts: 0 }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    fn client() -> PaynowClient {
        PaynowClient::new(Integration::new("1201", "key", "http://r", "http://r")).unwrap()
    }

    #[tokio::test]
    async fn test_paid_on_first_attempt_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/poll"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("reference=INV-1&status=Paid&hash=AB"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (completed, message) = client()
            .poll(
                &format!("{}/poll", server.uri()),
                PollConfig::new(5, INTERVAL),
                &CancellationToken::new(),
            )
            .await
            .into_parts();
        assert!(completed);
        assert_eq!(message, "Paid");
    }

    #[tokio::test]
    async fn test_pending_exhausts_after_max_attempts_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/poll"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("reference=INV-1&status=Pending&hash=AB"),
            )
            .expect(3)
            .mount(&server)
            .await;

        let started = Instant::now();
        let (completed, message) = client()
            .poll(
                &format!("{}/poll", server.uri()),
                PollConfig::new(3, INTERVAL),
                &CancellationToken::new(),
            )
            .await
            .into_parts();
        assert!(completed);
        assert_eq!(
            message,
            "Maximum attempts reached without payment confirmation after 3 attempts"
        );
        assert!(started.elapsed() >= INTERVAL * 3);
    }

    #[tokio::test]
    async fn test_zero_grace_still_allows_every_attempt_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/poll"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("reference=INV-1&status=Pending&hash=AB"),
            )
            .expect(3)
            .mount(&server)
            .await;

        let config = PollConfig::new(3, INTERVAL).with_grace(Duration::ZERO);
        let client = client();
        let poller = Poller::new(&client, config);
        assert_eq!(poller.config().deadline(), INTERVAL * 4);

        let outcome = poller
            .poll(&format!("{}/poll", server.uri()), &CancellationToken::new())
            .await;
        assert!(
            matches!(outcome, PollOutcome::Exhausted { attempts: 3, .. }),
            "{outcome}"
        );
        assert!(outcome.is_completed());
    }

    /// Returns a URL on a local port with no listener behind it.
    fn unreachable_url(route: &str) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}{route}")
    }

    #[tokio::test]
    async fn test_transport_error_fails_poll_without_retry() {
        let poll_url = unreachable_url("/poll");

        let outcome = client()
            .poll(&poll_url, PollConfig::new(5, INTERVAL), &CancellationToken::new())
            .await;
        let PollOutcome::Failed { attempts, error } = &outcome else {
            panic!("expected failure, got {outcome}");
        };
        assert_eq!(*attempts, 1);
        assert!(error.is_transport());
        let (completed, message) = outcome.into_parts();
        assert!(!completed);
        assert!(message.starts_with("Error fetching payment status"));
    }
}
