//! cache_delete tool implementation.
//!
//! Deletes a whole partition by name.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::Worker;
use swcache_core::Error;

use crate::tools::json_result;

/// Parameters for the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteParams {
    /// Partition name, e.g. `moodify-dynamic-v1.0.0`.
    pub partition: String,
}

/// Output from the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteOutput {
    pub partition: String,
    /// False if no such partition existed.
    pub deleted: bool,
}

/// Implementation of the cache_delete tool.
pub async fn delete_impl(worker: &Worker, params: CacheDeleteParams) -> Result<CallToolResult, McpError> {
    if params.partition.trim().is_empty() {
        return Err(Error::InvalidInput("partition cannot be empty".to_string()).into());
    }

    let deleted = worker.db().delete(&params.partition).await?;
    tracing::info!(partition = %params.partition, deleted, "cache partition delete requested");

    json_result(&CacheDeleteOutput { partition: params.partition, deleted })
}
