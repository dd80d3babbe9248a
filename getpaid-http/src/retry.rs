//! Retry policy for pipeline attempts.

use std::time::Duration;

use crate::config::ClientConfig;
use crate::transport::Outcome;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default base delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Decides whether a failed attempt is retried and how long to wait first.
///
/// Stateless: the pipeline consults it once per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of sends, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy allowing `retries` attempts after the first.
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            base_delay,
        }
    }

    /// Creates the policy described by a client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retries, config.retry_delay)
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Number of retries after the first attempt.
    pub fn retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    /// Whether attempt `attempt` (1-based) should be followed by another.
    ///
    /// Only transient network failures and 5xx responses are retried; the
    /// HTTP method is not considered. A request that could not be built is
    /// never resent.
    pub fn should_retry(&self, outcome: &Outcome, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        match outcome {
            Outcome::Network(error) => error.is_transient(),
            Outcome::Response(response) => response.status >= 500,
        }
    }

    /// Delay preceding attempt `attempt` (1-based).
    ///
    /// Zero for the first attempt, then `base`, `2 * base`, `4 * base`, ...
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let factor = 2u32.checked_pow(attempt - 2).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::RawResponse;

    fn status(code: u16) -> Outcome {
        Outcome::Response(RawResponse::new(code, ""))
    }

    fn network() -> Outcome {
        Outcome::Network(TransportError::Connect("dns error".into()))
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_before_attempt(1), Duration::ZERO);
        assert_eq!(policy.delay_before_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_before_attempt(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_before_attempt(4), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay_before_attempt(80), Duration::from_secs(u64::from(u32::MAX)));
    }

    #[test]
    fn test_retry_predicate() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(&network(), 1));
        assert!(policy.should_retry(&status(500), 1));
        assert!(policy.should_retry(&status(503), 2));
        assert!(policy.should_retry(&status(599), 3));

        assert!(!policy.should_retry(&status(200), 1));
        assert!(!policy.should_retry(&status(304), 1));
        assert!(!policy.should_retry(&status(400), 1));
        assert!(!policy.should_retry(&status(404), 1));
        assert!(!policy.should_retry(&status(429), 1));
    }

    #[test]
    fn test_unbuildable_request_not_retried() {
        let policy = RetryPolicy::default();
        let invalid = Outcome::Network(TransportError::InvalidRequest(
            "builder error: invalid HTTP header name".into(),
        ));
        assert!(!policy.should_retry(&invalid, 1));

        let timeout = Outcome::Network(TransportError::Timeout(Duration::from_secs(30)));
        assert!(policy.should_retry(&timeout, 1));
    }

    #[test]
    fn test_attempts_exhausted() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 4);
        assert!(policy.should_retry(&status(503), 3));
        assert!(!policy.should_retry(&status(503), 4));
        assert!(!policy.should_retry(&network(), 4));
    }

    #[test]
    fn test_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.retries(), 0);
        assert!(!policy.should_retry(&network(), 1));
    }

    #[test]
    fn test_zero_retries_means_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.should_retry(&status(500), 1));
    }
}
