//! Retry with exponential backoff for upstream forecast calls.
//!
//! Retried:
//! - Timeouts and connection failures
//! - 5xx, 408 and 429 responses
//!
//! Never retried:
//! - Other 4xx responses
//! - Payloads that arrive but fail validation

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use paddlecast_core::NetworkError;
use reqwest::StatusCode;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry (doubles each attempt)
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt + 1`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn retry_decision(&self) -> RetryDecision;
}

pub fn is_retryable_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        tracing::debug!("Status {} is retryable", status);
        return RetryDecision::Retry;
    }
    RetryDecision::NoRetry
}

pub fn is_retryable_network(error: &NetworkError) -> RetryDecision {
    match error {
        NetworkError::Timeout | NetworkError::ConnectionFailed(_) => RetryDecision::Retry,
        NetworkError::ServerError { status, .. } => match StatusCode::from_u16(*status) {
            Ok(status) => is_retryable_status(status),
            Err(_) => RetryDecision::NoRetry,
        },
        NetworkError::InvalidResponse(_) => RetryDecision::NoRetry,
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// retries are used up. The last error is returned in the latter two cases.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    E: Retryable + Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!("Upstream request succeeded after {} retries", attempt);
                }
                return Ok(value);
            }
            Err(e) if e.retry_decision() == RetryDecision::NoRetry => {
                tracing::debug!("Non-retryable upstream error: {}", e);
                return Err(e);
            }
            Err(e) if attempt >= policy.max_retries => {
                if policy.max_retries > 0 {
                    tracing::warn!("All {} upstream attempts exhausted: {}", attempt + 1, e);
                }
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    "Retryable upstream error on attempt {} of {}: {}; waiting {:?}",
                    attempt + 1,
                    policy.max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Retryable for TestError {
        fn retry_decision(&self) -> RetryDecision {
            match self {
                TestError::Transient => RetryDecision::Retry,
                TestError::Permanent => RetryDecision::NoRetry,
            }
        }
    }

    #[test]
    fn test_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.initial_delay, Duration::from_millis(200));
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(10, 100, 1000);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(63), Duration::from_millis(1000));
    }

    #[test]
    fn test_retryable_status_codes() {
        assert_eq!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::BAD_GATEWAY), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::REQUEST_TIMEOUT), RetryDecision::Retry);

        assert_eq!(is_retryable_status(StatusCode::BAD_REQUEST), RetryDecision::NoRetry);
        assert_eq!(is_retryable_status(StatusCode::NOT_FOUND), RetryDecision::NoRetry);
        assert_eq!(is_retryable_status(StatusCode::OK), RetryDecision::NoRetry);
    }

    #[test]
    fn test_retryable_network_errors() {
        assert_eq!(is_retryable_network(&NetworkError::Timeout), RetryDecision::Retry);
        assert_eq!(
            is_retryable_network(&NetworkError::ConnectionFailed("refused".into())),
            RetryDecision::Retry
        );
        assert_eq!(
            is_retryable_network(&NetworkError::InvalidResponse("eof".into())),
            RetryDecision::NoRetry
        );
        assert_eq!(
            is_retryable_network(&NetworkError::ServerError {
                status: 404,
                message: String::new()
            }),
            RetryDecision::NoRetry
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_until_exhausted() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), TestError> = with_retry(&RetryPolicy::new(2, 10, 100), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Transient)
        })
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), TestError> = with_retry(&RetryPolicy::default(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Permanent)
        })
        .await;

        assert!(matches!(result, Err(TestError::Permanent)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = with_retry(&RetryPolicy::default(), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TestError::Transient)
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
