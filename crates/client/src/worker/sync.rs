//! Background sync.

use serde::{Deserialize, Serialize};

use swcache_core::Error;

/// The only sync tag the worker reacts to.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Tag not handled by this worker.
    Ignored,
    Completed,
    /// The routine failed; nothing is retried.
    Failed { error: String },
}

/// Deferred work to replay once connectivity returns.
///
/// There is no queue of deferred requests yet, so this completes
/// immediately.
pub async fn run_background_sync() -> Result<(), Error> {
    Ok(())
}

/// Handle a sync event for `tag`, logging and swallowing failures.
pub async fn handle_sync<F, Fut>(tag: &str, routine: F) -> SyncOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    if tag != BACKGROUND_SYNC_TAG {
        tracing::debug!(tag, "ignoring sync event");
        return SyncOutcome::Ignored;
    }

    tracing::info!("background sync triggered");
    match routine().await {
        Ok(()) => {
            tracing::info!("background sync completed");
            SyncOutcome::Completed
        }
        Err(e) => {
            tracing::error!(error = %e, "background sync failed");
            SyncOutcome::Failed { error: e.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_sync_tag_completes() {
        assert_eq!(handle_sync("background-sync", run_background_sync).await, SyncOutcome::Completed);
    }

    #[tokio::test]
    async fn test_other_tags_ignored() {
        assert_eq!(handle_sync("outbox", run_background_sync).await, SyncOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let outcome = handle_sync(BACKGROUND_SYNC_TAG, || async { Err(Error::SyncFailed("offline".into())) }).await;
        assert!(matches!(outcome, SyncOutcome::Failed { error } if error.contains("offline")));
    }
}
