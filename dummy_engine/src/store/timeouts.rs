//! Store operation timeout helpers

use std::{future::Future, time::Duration};
use tokio::time::timeout;

use super::{StoreError, StoreResult};

/// Default timeout for single queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for commit transactions (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for loading a full session history (30 seconds)
pub const LONG_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a store operation, failing with [`StoreError::Timeout`] if it takes
/// longer than `duration`.
///
/// # Example
///
/// ```no_run
/// use dummy_engine::store::timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT};
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
///
/// let result = with_timeout(
///     DEFAULT_QUERY_TIMEOUT,
///     sqlx::query("SELECT id FROM dummy_sessions WHERE status = 'active'")
///         .fetch_all(pool)
/// ).await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<StoreError>,
{
    match timeout(duration, future).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}

/// Run a store operation with the default query timeout (5 seconds)
pub async fn with_default_timeout<F, T, E>(future: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<StoreError>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_constants() {
        assert_eq!(DEFAULT_QUERY_TIMEOUT.as_secs(), 5);
        assert_eq!(DEFAULT_TRANSACTION_TIMEOUT.as_secs(), 10);
        assert_eq!(LONG_OPERATION_TIMEOUT.as_secs(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_operation_times_out() {
        let never = std::future::pending::<Result<(), sqlx::Error>>();
        let err = with_timeout(Duration::from_secs(5), never).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_secs(5)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let failing = async { Err::<(), _>(sqlx::Error::RowNotFound) };
        let err = with_default_timeout(failing).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
