//! MCP tool implementations.
//!
//! Each tool is a thin adapter from JSON parameters to a [`Worker`] handler;
//! outputs are pretty-printed JSON text content.

pub mod cache;
pub mod events;
pub mod fetch;
pub mod lifecycle;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swcache_core::Error;

/// Serialize a tool output as the single text content of a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use swcache_client::Worker;
    use swcache_core::{CacheDb, WorkerConfig};

    pub(crate) use swcache_client::testing::FakeNetwork;

    pub(crate) const ORIGIN: &str = "https://moodify.example";

    pub(crate) async fn worker(network: Arc<FakeNetwork>) -> Worker {
        let config = WorkerConfig { origin: ORIGIN.into(), ..Default::default() };
        Worker::new(config, CacheDb::open_in_memory().await.unwrap(), network).unwrap()
    }

    /// Install and activate with every static asset available.
    pub(crate) async fn activated_worker(network: Arc<FakeNetwork>) -> Worker {
        for path in ["/", "/index.html", "/css/styles.css", "/js/script.js"] {
            network.serve(&format!("{ORIGIN}{path}"), 200, "<h1>Moodify</h1>");
        }
        network.serve("https://cdnjs.cloudflare.com/ajax/libs/Chart.js/3.9.1/chart.min.js", 200, "chart");
        let worker = worker(network).await;
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        worker
    }

    pub(crate) fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
