//! Bounded waits
//!
//! Every suspension point (tool provider load, agent turn) goes through
//! [`bounded`]. When the deadline passes the inner future is dropped, which
//! abandons the call; a late result is never observed.

use std::future::Future;
use std::time::Duration;

use crate::error::{AgentError, Result};

/// Await `fut` for at most `limit`.
///
/// Elapsed deadlines become [`AgentError::Timeout`] naming `operation`.
pub async fn bounded<F, T>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, after_secs = limit.as_secs(), "Deadline elapsed");
            Err(AgentError::Timeout {
                operation: operation.to_string(),
                after: limit,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_is_timeout() {
        let err = bounded(Duration::from_secs(5), "slow op", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "slow op timed out after 5s");
    }

    #[tokio::test]
    async fn test_inner_result_passes_through() {
        let ok = bounded(Duration::from_secs(5), "fast op", async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = bounded::<_, ()>(Duration::from_secs(5), "failing op", async {
            Err(AgentError::Auth("bad key".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AgentError::Auth(_)));
    }
}
