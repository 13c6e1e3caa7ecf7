//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::AgentxError;

/// Wrap a fallible future with a deadline; elapsing yields
/// [`AgentxError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, AgentxError>>,
) -> Result<T, AgentxError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(AgentxError::Timeout(duration.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapsed_deadline_is_a_timeout_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, AgentxError>(1)
        };
        let err = with_timeout(Duration::from_millis(50), slow).await.unwrap_err();
        assert!(matches!(err, AgentxError::Timeout(50)));
    }
}
