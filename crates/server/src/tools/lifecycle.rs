//! worker_install, worker_activate and worker_status tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use swcache_client::Worker;

use super::json_result;

/// Run the install event and report what was cached.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&report)
}

/// Run the activate event and report the partitions it removed.
pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&report)
}

pub async fn status_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    json_result(&worker.status().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::{FakeNetwork, output, worker};
    use swcache_client::{ActivateReport, InstallReport, WorkerState, WorkerStatus};

    #[tokio::test]
    async fn test_install_then_activate() {
        let worker = worker(Arc::new(FakeNetwork::new())).await;
        worker.db().open_partition("moodify-dynamic-v0.1.0").await.unwrap();

        let install: InstallReport = output(&install_impl(&worker).await.unwrap());
        assert!(install.skip_waiting);
        assert!(install.error.is_some());

        let activate: ActivateReport = output(&activate_impl(&worker).await.unwrap());
        assert_eq!(activate.deleted, vec!["moodify-dynamic-v0.1.0".to_string()]);

        let status: WorkerStatus = output(&status_impl(&worker).await.unwrap());
        assert_eq!(status.state, WorkerState::Activated);
        assert_eq!(status.static_cache, "moodify-static-v1.0.0");
    }

    #[tokio::test]
    async fn test_activate_before_install_is_an_error() {
        let worker = worker(Arc::new(FakeNetwork::new())).await;
        let err = activate_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32006);
    }
}
