//! cache_get tool implementation.
//!
//! Retrieves a stored response by request URL.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::Worker;
use swcache_core::{Error, Request};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached GET request, absolute or relative to the origin.
    pub url: String,

    /// Only look in this partition; all partitions are searched otherwise.
    #[serde(default)]
    pub partition: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_len: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &Worker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = worker.config().resolve(&params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::get(url);
    let db = worker.db();

    let found = match &params.partition {
        Some(name) => {
            if db.has(name).await? { db.open_partition(name).await?.match_request(&request).await? } else { None }
        }
        None => db.match_request(&request).await?,
    };
    let response = found.ok_or_else(|| Error::CacheMiss(request.url.to_string()))?;

    let output = CacheGetOutput {
        url: request.url.to_string(),
        status: response.status,
        headers: response.headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        body: response.text(),
        body_len: response.body.len(),
    };
    json_result(&output)
}
