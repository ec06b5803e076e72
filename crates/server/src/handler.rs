//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to the
//! worker's event handlers and the cache inspection tools.
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_client::Worker;

use crate::tools::{
    cache::{self, CacheDeleteParams, CacheGetParams, CacheKeysParams},
    events::{self, ClientIdParams, ClientRegisterParams, NotificationClickParams, WorkerPushParams, WorkerSyncParams},
    fetch::{self, WorkerFetchParams},
    lifecycle,
};

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwcacheServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<Worker>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwcacheServer {
    /// Create a new server handler around a worker.
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { tool_router: Self::tool_router(), worker }
    }

    #[tool(description = "Run the install event: fetch every static asset and store them all in the static cache, \
                          or none if any fetch fails. The install completes either way.")]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        lifecycle::install_impl(&self.worker).await
    }

    #[tool(description = "Run the activate event: delete caches from other versions and claim open windows. \
                          Requires a completed install.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        lifecycle::activate_impl(&self.worker).await
    }

    /// Route one request through the worker.
    ///
    /// Static assets are cache-first, API and non-GET requests pass through,
    /// everything else is network-first with cache and offline-page fallbacks.
    #[tool(description = "Dispatch a fetch event. Returns the outcome (response, passthrough, no_response, \
                          network_error), where the response came from, and its status, headers and body.")]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch::fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Dispatch a sync event. Only the background-sync tag is handled; failures are not retried.")]
    async fn worker_sync(&self, params: Parameters<WorkerSyncParams>) -> Result<CallToolResult, McpError> {
        events::sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Dispatch a push event with a JSON {title, body} payload and show a notification.")]
    async fn worker_push(&self, params: Parameters<WorkerPushParams>) -> Result<CallToolResult, McpError> {
        events::push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a shown notification. The explore action focuses or opens the app root; \
                          any click closes the notification.")]
    async fn notification_click(&self, params: Parameters<NotificationClickParams>) -> Result<CallToolResult, McpError> {
        events::click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Register an open application window so activation can claim it.")]
    async fn client_register(&self, params: Parameters<ClientRegisterParams>) -> Result<CallToolResult, McpError> {
        events::register_impl(&self.worker, params.0).await
    }

    #[tool(description = "Open a new window at a URL; it is controlled by the worker and takes focus.")]
    async fn client_open(&self, params: Parameters<ClientRegisterParams>) -> Result<CallToolResult, McpError> {
        events::open_impl(&self.worker, params.0).await
    }

    #[tool(description = "Focus an open window by client id.")]
    async fn client_focus(&self, params: Parameters<ClientIdParams>) -> Result<CallToolResult, McpError> {
        events::focus_impl(&self.worker, params.0).await
    }

    #[tool(description = "Forget a window that was closed, by client id.")]
    async fn client_close(&self, params: Parameters<ClientIdParams>) -> Result<CallToolResult, McpError> {
        events::close_impl(&self.worker, params.0).await
    }

    #[tool(description = "List open windows with their controlled and focused flags.")]
    async fn client_list(&self) -> Result<CallToolResult, McpError> {
        events::list_impl(&self.worker).await
    }

    #[tool(description = "List cache partitions with entry counts, or the entries of one partition.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        cache::keys_impl(&self.worker, params.0).await
    }

    #[tool(description = "Read a stored response by URL from one partition or from all of them.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        cache::get_impl(&self.worker, params.0).await
    }

    #[tool(description = "Delete a cache partition by name.")]
    async fn cache_delete(&self, params: Parameters<CacheDeleteParams>) -> Result<CallToolResult, McpError> {
        cache::delete_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report the worker state, current cache names, pending cache writes, clients and notifications.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        lifecycle::status_impl(&self.worker).await
    }
}

impl ServerHandler for SwcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{FakeNetwork, worker};

    #[tokio::test]
    async fn test_every_event_is_a_tool() {
        let server = SwcacheServer::new(Arc::new(worker(Arc::new(FakeNetwork::new())).await));
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "cache_delete",
                "cache_get",
                "cache_keys",
                "client_close",
                "client_focus",
                "client_list",
                "client_open",
                "client_register",
                "notification_click",
                "worker_activate",
                "worker_fetch",
                "worker_install",
                "worker_push",
                "worker_status",
                "worker_sync",
            ]
        );
    }
}
