//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap outbound calls with a finite deadline
//! - Turn an elapsed deadline into an ordinary I/O error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - No call made by a probe may wait indefinitely

use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::time::timeout;

/// Run `fut` with a deadline, mapping expiry to `io::ErrorKind::TimedOut`.
pub async fn with_deadline<T, F>(deadline: Duration, what: &str, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{} timed out after {}s", what, deadline.as_secs()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let err = with_deadline(Duration::from_secs(15), "connect", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, io::Error>(())
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(err.to_string(), "connect timed out after 15s");
    }

    #[tokio::test]
    async fn test_inner_result_passes_through() {
        let value = with_deadline(Duration::from_secs(1), "noop", async { Ok::<_, io::Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
