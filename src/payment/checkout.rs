//! Hosted checkout: session creation and bounded status polling.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use tokenomics_core::{CheckoutSession, CheckoutStatusResponse, PackageTier};

use crate::client::ClientError;
use crate::config::Config;

/// Placeholder the checkout provider substitutes with the real session id.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Backend calls the checkout path depends on.
#[allow(async_fn_in_trait)]
pub trait CheckoutBackend {
    async fn create_checkout_session(
        &self,
        package: PackageTier,
        origin_url: &str,
    ) -> Result<CheckoutSession, ClientError>;

    async fn checkout_status(&self, session_id: &str) -> Result<CheckoutStatusResponse, ClientError>;
}

/// Client-side view of a checkout session. Everything but `Checking` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutState {
    Checking,
    Success,
    Failed,
    Error,
    Timeout,
}

impl CheckoutState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckoutState::Checking)
    }

    /// Maps a backend status report: paid wins, then expired, anything
    /// else keeps polling.
    pub fn from_status(status: &CheckoutStatusResponse) -> Self {
        if status.is_paid() {
            CheckoutState::Success
        } else if status.is_expired() {
            CheckoutState::Failed
        } else {
            CheckoutState::Checking
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckoutState::Checking => "checking",
            CheckoutState::Success => "success",
            CheckoutState::Failed => "failed",
            CheckoutState::Error => "error",
            CheckoutState::Timeout => "timeout",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub state: CheckoutState,
    /// Status requests actually issued
    pub attempts: u32,
    pub last_status: Option<CheckoutStatusResponse>,
    pub error: Option<String>,
}

/// Polls a checkout session a fixed number of times at a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutPoller {
    max_attempts: u32,
    interval: Duration,
}

impl Default for CheckoutPoller {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(2))
    }
}

impl CheckoutPoller {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.checkout.max_attempts, config.poll_interval())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs until a terminal state. Never issues more than `max_attempts`
    /// status requests; a transport or backend failure ends the poll as
    /// `Error` without retrying.
    #[instrument(skip(self, backend))]
    pub async fn poll<B: CheckoutBackend>(&self, backend: &B, session_id: &str) -> PollOutcome {
        let mut last_status = None;

        for attempt in 1..=self.max_attempts {
            debug!(attempt, max_attempts = self.max_attempts, "Checking payment status");

            match backend.checkout_status(session_id).await {
                Ok(status) => {
                    let state = CheckoutState::from_status(&status);
                    if state.is_terminal() {
                        info!(attempt, state = %state, "Checkout reached terminal state");
                        return PollOutcome {
                            state,
                            attempts: attempt,
                            last_status: Some(status),
                            error: None,
                        };
                    }
                    last_status = Some(status);
                }
                Err(e) => {
                    warn!(attempt, "Checkout status request failed: {}", e);
                    return PollOutcome {
                        state: CheckoutState::Error,
                        attempts: attempt,
                        last_status,
                        error: Some(e.user_message()),
                    };
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        warn!(max_attempts = self.max_attempts, "Payment status check timed out");
        PollOutcome {
            state: CheckoutState::Timeout,
            attempts: self.max_attempts,
            last_status,
            error: None,
        }
    }
}

/// Creates a hosted checkout session for the package and returns the
/// redirect target.
#[instrument(skip(backend))]
pub async fn start_checkout<B: CheckoutBackend>(
    backend: &B,
    package: PackageTier,
    origin_url: &str,
) -> Result<CheckoutSession, ClientError> {
    info!(
        package = %package,
        amount_usd = package.usd_price(),
        "Starting hosted checkout"
    );
    let session = backend.create_checkout_session(package, origin_url).await?;
    info!(session_id = %session.session_id, "Checkout session created");
    Ok(session)
}

pub fn success_url(origin_url: &str) -> String {
    format!(
        "{}/success?session_id={}",
        origin_url.trim_end_matches('/'),
        SESSION_ID_PLACEHOLDER
    )
}

pub fn cancel_url(origin_url: &str) -> String {
    format!("{}/pricing", origin_url.trim_end_matches('/'))
}

/// Pulls `session_id` out of a checkout return URL. A bare session id is
/// returned unchanged.
pub fn session_id_from_return(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "session_id")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty() && value != SESSION_ID_PLACEHOLDER),
        Err(_) => Some(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<CheckoutStatusResponse, ClientError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<CheckoutStatusResponse, ClientError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl CheckoutBackend for ScriptedBackend {
        async fn create_checkout_session(
            &self,
            package: PackageTier,
            origin_url: &str,
        ) -> Result<CheckoutSession, ClientError> {
            Ok(CheckoutSession {
                url: format!("https://checkout.example/{}?return={}", package, origin_url),
                session_id: "cs_test_1".to_string(),
            })
        }

        async fn checkout_status(&self, _session_id: &str) -> Result<CheckoutStatusResponse, ClientError> {
            *self.calls.lock().unwrap() += 1;
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(status("open", "unpaid")))
        }
    }

    fn status(status: &str, payment_status: &str) -> CheckoutStatusResponse {
        CheckoutStatusResponse {
            status: status.to_string(),
            payment_status: payment_status.to_string(),
            amount_total: Some(7900),
            currency: Some("usd".to_string()),
            metadata: Default::default(),
        }
    }

    fn poller() -> CheckoutPoller {
        CheckoutPoller::new(5, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_never_paid_times_out_after_five_requests() {
        let backend = ScriptedBackend::new(vec![]);
        let outcome = poller().poll(&backend, "cs_test_1").await;

        assert_eq!(outcome.state, CheckoutState::Timeout);
        assert_eq!(outcome.attempts, 5);
        assert_eq!(backend.calls(), 5);
        assert_eq!(outcome.last_status.unwrap().payment_status, "unpaid");
    }

    #[tokio::test]
    async fn test_paid_on_third_attempt() {
        let backend = ScriptedBackend::new(vec![
            Ok(status("open", "unpaid")),
            Ok(status("open", "unpaid")),
            Ok(status("complete", "paid")),
        ]);
        let outcome = poller().poll(&backend, "cs_test_1").await;

        assert_eq!(outcome.state, CheckoutState::Success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_expired_session_fails() {
        let backend = ScriptedBackend::new(vec![Ok(status("expired", "unpaid"))]);
        let outcome = poller().poll(&backend, "cs_test_1").await;

        assert_eq!(outcome.state, CheckoutState::Failed);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_transport_error_stops_polling() {
        let backend = ScriptedBackend::new(vec![
            Ok(status("open", "unpaid")),
            Err(ClientError::from_status(500, r#"{"detail":"Error getting checkout status: boom"}"#)),
        ]);
        let outcome = poller().poll(&backend, "cs_test_1").await;

        assert_eq!(outcome.state, CheckoutState::Error);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(backend.calls(), 2);
        assert_eq!(outcome.error.as_deref(), Some("Error getting checkout status: boom"));
    }

    #[tokio::test]
    async fn test_zero_budget_times_out_without_requests() {
        let backend = ScriptedBackend::new(vec![Ok(status("complete", "paid"))]);
        let outcome = CheckoutPoller::new(0, Duration::ZERO).poll(&backend, "cs").await;

        assert_eq!(outcome.state, CheckoutState::Timeout);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_start_checkout_returns_redirect() {
        let backend = ScriptedBackend::new(vec![]);
        let session = start_checkout(&backend, PackageTier::Pro, "https://app.example")
            .await
            .unwrap();
        assert_eq!(session.session_id, "cs_test_1");
        assert!(session.url.starts_with("https://checkout.example/pro"));
    }

    #[test]
    fn test_paid_takes_precedence_over_status() {
        assert_eq!(CheckoutState::from_status(&status("expired", "paid")), CheckoutState::Success);
        assert_eq!(CheckoutState::from_status(&status("open", "no_payment_required")), CheckoutState::Checking);
        assert!(!CheckoutState::Checking.is_terminal());
        assert!(CheckoutState::Timeout.is_terminal());
    }

    #[test]
    fn test_return_urls() {
        assert_eq!(
            success_url("https://app.example/"),
            "https://app.example/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(cancel_url("https://app.example"), "https://app.example/pricing");
        assert_eq!(
            session_id_from_return("https://app.example/success?session_id=cs_live_42").as_deref(),
            Some("cs_live_42")
        );
        assert_eq!(session_id_from_return("cs_live_42").as_deref(), Some("cs_live_42"));
        assert_eq!(session_id_from_return("https://app.example/pricing"), None);
        assert_eq!(session_id_from_return("  "), None);
    }
}
