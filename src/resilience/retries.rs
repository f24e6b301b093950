//! Retry logic.
//!
//! # Responsibilities
//! - Classify transport failures into retryable categories
//! - Decide whether a failed attempt may be re-issued
//!
//! # Design Decisions
//! - Policy is data: an allow-list of categories plus a retry count
//! - Only interrupted I/O, unresolved hosts and TLS negotiation failures are transient
//! - HTTP status errors and malformed requests are never retried

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Transport failure categories eligible for retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Timed out or interrupted while reading/writing/connecting.
    InterruptedIo,
    /// Host name could not be resolved.
    UnknownHost,
    /// TLS/SSL negotiation failed.
    Tls,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InterruptedIo => "interrupted_io",
            FailureKind::UnknownHost => "unknown_host",
            FailureKind::Tls => "tls",
        }
    }

    /// Classify a plain I/O error.
    pub fn from_io(err: &io::Error) -> Option<Self> {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => {
                Some(FailureKind::InterruptedIo)
            }
            _ => Self::from_message(&err.to_string()),
        }
    }

    /// Classify an arbitrary error by walking its source chain.
    ///
    /// A `reqwest::Error` is judged by its type only: its text carries the
    /// request URL, which must never be matched as if it were a cause.
    pub fn classify(err: &(dyn StdError + 'static)) -> Option<Self> {
        let mut current: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(req) = e.downcast_ref::<reqwest::Error>() {
                if req.is_builder() || req.is_status() || req.is_decode() {
                    return None;
                }
                if req.is_timeout() {
                    return Some(FailureKind::InterruptedIo);
                }
            } else if let Some(io_err) = e.downcast_ref::<io::Error>() {
                if let Some(kind) = Self::from_io(io_err) {
                    return Some(kind);
                }
                if let Some(inner) = io_err.get_ref() {
                    if let Some(kind) = Self::classify(inner) {
                        return Some(kind);
                    }
                }
            } else if let Some(kind) = Self::from_message(&e.to_string()) {
                return Some(kind);
            }
            current = e.source();
        }
        None
    }

    fn from_message(msg: &str) -> Option<Self> {
        let lowercase = msg.to_lowercase();
        if lowercase.contains("dns error")
            || lowercase.contains("failed to lookup address")
            || lowercase.contains("name or service not known")
            || lowercase.contains("name resolution")
            || lowercase.contains("nodename nor servname")
            || lowercase.contains("no address associated")
            || lowercase.contains("no such host")
        {
            Some(FailureKind::UnknownHost)
        } else if lowercase.contains("tls")
            || lowercase.contains("ssl")
            || lowercase.contains("certificate")
            || lowercase.contains("handshake")
        {
            Some(FailureKind::Tls)
        } else if lowercase.contains("timed out") || lowercase.contains("interrupted") {
            Some(FailureKind::InterruptedIo)
        } else {
            None
        }
    }
}

/// Display of `err` followed by every cause in its source chain.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        current = cause.source();
    }
    message
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interrupted_io" => Ok(FailureKind::InterruptedIo),
            "unknown_host" => Ok(FailureKind::UnknownHost),
            "tls" => Ok(FailureKind::Tls),
            other => Err(format!("unknown failure category '{}'", other)),
        }
    }
}

/// Retry policy applied by the connection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Categories that may be retried.
    pub retry_on: HashSet<FailureKind>,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_on: [FailureKind::InterruptedIo, FailureKind::UnknownHost, FailureKind::Tls]
                .into_iter()
                .collect(),
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryPolicy {
    /// Build from config. Unknown categories are skipped (validation rejects them earlier).
    pub fn from_config(config: &RetryConfig) -> Self {
        let retry_on = config
            .retry_on
            .iter()
            .filter_map(|name| match name.parse() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    tracing::warn!(category = %name, error = %e, "Ignoring retry category");
                    None
                }
            })
            .collect();

        Self {
            max_retries: config.max_retries,
            retry_on,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            retry_on: HashSet::new(),
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Whether attempt number `attempt` (1-based) that failed with `kind` may be re-issued.
    pub fn should_retry(&self, kind: Option<FailureKind>, attempt: u32) -> bool {
        match kind {
            Some(kind) => attempt <= self.max_retries && self.retry_on.contains(&kind),
            None => false,
        }
    }

    /// Delay before re-issuing after attempt number `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

/// Last failure of an operation that was given up on.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub error: E,
    pub kind: Option<FailureKind>,
    pub attempts: u32,
}

/// Run `operation`, re-issuing it while the failure is allow-listed and retries remain.
pub async fn retry_transient<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, Exhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: StdError + 'static,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let kind = FailureKind::classify(&error);
                if !policy.should_retry(kind, attempt) {
                    return Err(Exhausted { error, kind, attempts: attempt });
                }

                let delay = policy.delay(attempt);
                tracing::info!(
                    attempt = attempt,
                    kind = ?kind,
                    delay = ?delay,
                    error = %error,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retries_only_allow_listed_kinds() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(Some(FailureKind::InterruptedIo), 1));
        assert!(policy.should_retry(Some(FailureKind::UnknownHost), 2));
        assert!(policy.should_retry(Some(FailureKind::Tls), 3));
        assert!(!policy.should_retry(None, 1));
    }

    #[test]
    fn test_retry_limit() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(Some(FailureKind::Tls), 3));
        assert!(!policy.should_retry(Some(FailureKind::Tls), 4));
    }

    #[test]
    fn test_policy_from_config_subset() {
        let config = RetryConfig {
            retry_on: vec!["tls".to_string(), "bogus".to_string()],
            ..RetryConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert!(policy.should_retry(Some(FailureKind::Tls), 1));
        assert!(!policy.should_retry(Some(FailureKind::UnknownHost), 1));
        assert_eq!(policy.retry_on.len(), 1);
    }

    #[test]
    fn test_none_never_retries() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(Some(FailureKind::InterruptedIo), 1));
    }

    #[test]
    fn test_classify_io() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "connect timed out");
        assert_eq!(FailureKind::from_io(&err), Some(FailureKind::InterruptedIo));

        let err = io::Error::new(io::ErrorKind::Other, "failed to lookup address information");
        assert_eq!(FailureKind::from_io(&err), Some(FailureKind::UnknownHost));

        let err = io::Error::new(io::ErrorKind::InvalidData, "invalid peer certificate: UnknownIssuer");
        assert_eq!(FailureKind::from_io(&err), Some(FailureKind::Tls));

        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        assert_eq!(FailureKind::from_io(&err), None);
    }

    #[derive(Debug)]
    struct RequestFailed(io::Error);

    impl fmt::Display for RequestFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl StdError for RequestFailed {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_classify_walks_source_chain() {
        let err = RequestFailed(io::Error::new(io::ErrorKind::TimedOut, "deadline"));
        assert_eq!(FailureKind::classify(&err), Some(FailureKind::InterruptedIo));

        let err = RequestFailed(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(FailureKind::classify(&err), None);
    }

    #[test]
    fn test_error_chain_joins_causes() {
        let err = RequestFailed(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
        assert_eq!(error_chain(&err), "request failed: connection refused");
    }

    #[test]
    fn test_parse_roundtrip() {
        for kind in [FailureKind::InterruptedIo, FailureKind::UnknownHost, FailureKind::Tls] {
            assert_eq!(kind.as_str().parse::<FailureKind>(), Ok(kind));
        }
        assert!("http_503".parse::<FailureKind>().is_err());
    }

    async fn count_attempts(policy: &RetryPolicy, kind: io::ErrorKind, msg: &'static str) -> u32 {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient(policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(io::Error::new(kind, msg)) }
        })
        .await;
        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, calls.load(Ordering::SeqCst));
        calls.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retried_three_times() {
        let policy = RetryPolicy::default();
        assert_eq!(count_attempts(&policy, io::ErrorKind::TimedOut, "read timed out").await, 4);
        assert_eq!(count_attempts(&policy, io::ErrorKind::Other, "dns error: no such host").await, 4);
        assert_eq!(count_attempts(&policy, io::ErrorKind::Other, "tls handshake eof").await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_failures_not_retried() {
        let policy = RetryPolicy::default();
        assert_eq!(count_attempts(&policy, io::ErrorKind::ConnectionRefused, "connection refused").await, 1);
        assert_eq!(count_attempts(&policy, io::ErrorKind::InvalidInput, "malformed request").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let value = retry_transient(&RetryPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 2);
    }
}
