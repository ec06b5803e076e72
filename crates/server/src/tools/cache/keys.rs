//! cache_keys tool implementation.
//!
//! Lists partitions, or the entries of one partition.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::Worker;
use swcache_core::{CachedEntry, Error, PartitionInfo};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// List the entries of this partition instead of the partitions.
    #[serde(default)]
    pub partition: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Partitions in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<PartitionInfo>,

    /// Entries of the requested partition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<CachedEntry>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(worker: &Worker, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let db = worker.db();
    let output = match params.partition {
        Some(name) => {
            if !db.has(&name).await? {
                return Err(Error::CacheMiss(format!("no partition named {name}")).into());
            }
            let entries = db.open_partition(&name).await?.entries().await?;
            CacheKeysOutput { partitions: Vec::new(), entries }
        }
        None => CacheKeysOutput { partitions: db.partitions().await?, entries: Vec::new() },
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::{FakeNetwork, activated_worker, output};

    #[tokio::test]
    async fn test_keys_lists_current_partitions() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;

        let out: CacheKeysOutput = output(&keys_impl(&worker, CacheKeysParams::default()).await.unwrap());
        let names: Vec<&str> = out.partitions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["moodify-static-v1.0.0"]);
        assert_eq!(out.partitions[0].entries, 5);
    }

    #[tokio::test]
    async fn test_keys_lists_entries() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;

        let params = CacheKeysParams { partition: Some("moodify-static-v1.0.0".into()) };
        let out: CacheKeysOutput = output(&keys_impl(&worker, params).await.unwrap());
        assert_eq!(out.entries.len(), 5);
        assert!(out.entries.iter().all(|e| e.status == 200 && e.method == "GET"));
    }

    #[tokio::test]
    async fn test_keys_unknown_partition() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;
        let params = CacheKeysParams { partition: Some("nope".into()) };
        assert!(keys_impl(&worker, params).await.is_err());
    }
}
