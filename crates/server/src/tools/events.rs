//! worker_sync, worker_push, notification_click and client_* tool
//! implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{SyncOutcome, Worker};
use swcache_core::Error;

use super::json_result;

/// Parameters for the worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncParams {
    /// Sync registration tag; only `background-sync` is handled.
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncOutput {
    pub tag: String,
    pub outcome: SyncOutcome,
}

/// Parameters for the worker_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushParams {
    /// Raw push message body, expected to be JSON `{"title": ..., "body": ...}`.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushOutput {
    /// The notification shown, absent for a push without data.
    pub notification: Option<swcache_client::Notification>,
}

/// Parameters for the notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    pub notification_id: u64,
    /// Action button clicked (`explore`, `close`); omit for a click on the body.
    #[serde(default)]
    pub action: Option<String>,
}

/// Parameters for the client_register tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientRegisterParams {
    /// URL the window is showing, absolute or relative to the origin.
    pub url: String,
}

/// Parameters for the client_focus and client_close tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientIdParams {
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientListOutput {
    pub clients: Vec<swcache_client::Client>,
}

pub async fn sync_impl(worker: &Worker, params: WorkerSyncParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.handle_sync(&params.tag).await;
    json_result(&WorkerSyncOutput { tag: params.tag, outcome })
}

pub async fn push_impl(worker: &Worker, params: WorkerPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.handle_push(params.data.as_deref()).await?;
    json_result(&WorkerPushOutput { notification })
}

pub async fn click_impl(worker: &Worker, params: NotificationClickParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.handle_notification_click(params.notification_id, params.action.as_deref()).await?;
    json_result(&outcome)
}

/// Record a window opened outside the worker, so activation can claim it
/// and notification clicks can focus it.
pub async fn register_impl(worker: &Worker, params: ClientRegisterParams) -> Result<CallToolResult, McpError> {
    let url = worker.config().resolve(&params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    json_result(&worker.clients().register(&url))
}

/// Open a new window controlled by the worker.
pub async fn open_impl(worker: &Worker, params: ClientRegisterParams) -> Result<CallToolResult, McpError> {
    let url = worker.config().resolve(&params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    json_result(&worker.clients().open_window(&url))
}

pub async fn focus_impl(worker: &Worker, params: ClientIdParams) -> Result<CallToolResult, McpError> {
    json_result(&worker.clients().focus(&params.client_id)?)
}

/// Forget a window the host closed.
pub async fn close_impl(worker: &Worker, params: ClientIdParams) -> Result<CallToolResult, McpError> {
    json_result(&worker.clients().remove(&params.client_id)?)
}

pub async fn list_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    json_result(&ClientListOutput { clients: worker.clients().list() })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::{ORIGIN, FakeNetwork, activated_worker, output};
    use swcache_client::{ClickOutcome, Client, WindowOutcome};

    #[tokio::test]
    async fn test_sync() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;
        let handled: WorkerSyncOutput =
            output(&sync_impl(&worker, WorkerSyncParams { tag: "background-sync".into() }).await.unwrap());
        assert_eq!(handled.outcome, SyncOutcome::Completed);

        let ignored: WorkerSyncOutput =
            output(&sync_impl(&worker, WorkerSyncParams { tag: "other".into() }).await.unwrap());
        assert_eq!(ignored.outcome, SyncOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_push_and_explore_focuses_registered_root() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;
        let root: Client = output(&register_impl(&worker, ClientRegisterParams { url: "/".into() }).await.unwrap());
        assert_eq!(root.url, format!("{ORIGIN}/"));

        let data = r#"{"title":"Mood streak","body":"Seven days in a row"}"#;
        let pushed: WorkerPushOutput =
            output(&push_impl(&worker, WorkerPushParams { data: Some(data.into()) }).await.unwrap());
        let shown = pushed.notification.unwrap();
        assert_eq!(shown.options.actions.len(), 2);

        let params = NotificationClickParams { notification_id: shown.id, action: Some("explore".into()) };
        let clicked: ClickOutcome = output(&click_impl(&worker, params).await.unwrap());
        assert_eq!(clicked.window, Some(WindowOutcome::Focused { client: Client { focused: true, ..root } }));
    }

    #[tokio::test]
    async fn test_client_window_operations() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;
        let history: Client =
            output(&register_impl(&worker, ClientRegisterParams { url: "/history".into() }).await.unwrap());
        let opened: Client = output(&open_impl(&worker, ClientRegisterParams { url: "/journal".into() }).await.unwrap());
        assert!(opened.controlled && opened.focused);

        let focused: Client =
            output(&focus_impl(&worker, ClientIdParams { client_id: history.id.clone() }).await.unwrap());
        assert!(focused.focused);

        let closed: Client =
            output(&close_impl(&worker, ClientIdParams { client_id: opened.id.clone() }).await.unwrap());
        assert_eq!(closed.id, opened.id);

        let listed: ClientListOutput = output(&list_impl(&worker).await.unwrap());
        assert_eq!(listed.clients.len(), 1);
        assert!(listed.clients[0].focused);

        let err = focus_impl(&worker, ClientIdParams { client_id: opened.id }).await.unwrap_err();
        assert_eq!(err.code.0, -32007);
    }

    #[tokio::test]
    async fn test_push_errors() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;
        let empty: WorkerPushOutput = output(&push_impl(&worker, WorkerPushParams { data: None }).await.unwrap());
        assert!(empty.notification.is_none());

        let err = push_impl(&worker, WorkerPushParams { data: Some("nope".into()) }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);

        let params = NotificationClickParams { notification_id: 42, action: None };
        assert_eq!(click_impl(&worker, params).await.unwrap_err().code.0, -32008);
    }
}
