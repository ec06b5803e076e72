//! worker_fetch tool implementation.
//!
//! Dispatches one request through the worker's fetch handler. Requests the
//! worker does not intercept are performed directly against the network,
//! the way the host would.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{FetchOutcome, Network, ResponseSource, Worker};
use swcache_core::{Error, PassthroughReason, Request, Response};

use super::json_result;

/// Parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path resolved against the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers, e.g. `{"accept": "text/html"}`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Wait for cache writes started by this request before returning.
    #[serde(default)]
    pub settle: bool,
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Passthrough,
    Response,
    NoResponse,
    NetworkError,
}

/// Output from the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub url: String,
    pub outcome: OutcomeKind,
    /// Why the request was not intercepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<PassthroughReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8 (lossy).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Cache writes awaited when `settle` was requested.
    pub settled: usize,
}

impl WorkerFetchOutput {
    fn new(url: String, outcome: OutcomeKind) -> Self {
        Self {
            url,
            outcome,
            reason: None,
            source: None,
            status: None,
            headers: BTreeMap::new(),
            body: None,
            error: None,
            settled: 0,
        }
    }

    fn with_response(mut self, response: &Response) -> Self {
        self.status = Some(response.status);
        self.headers = response.headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.body = Some(response.text());
        self
    }
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = worker.config().resolve(&params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = params
        .headers
        .iter()
        .fold(Request::new(params.method.trim(), url), |request, (name, value)| request.with_header(name, value.clone()));

    let target = request.url.to_string();
    let mut output = match worker.handle_fetch(&request).await {
        FetchOutcome::Passthrough(reason) => {
            let mut output = WorkerFetchOutput::new(target, OutcomeKind::Passthrough);
            output.reason = Some(reason);
            match worker.network().fetch(&request).await {
                Ok(response) => output.with_response(&response),
                Err(e) => {
                    output.error = Some(e.to_string());
                    output
                }
            }
        }
        FetchOutcome::Response { response, source } => {
            let mut output = WorkerFetchOutput::new(target, OutcomeKind::Response).with_response(&response);
            output.source = Some(source);
            output
        }
        FetchOutcome::NoResponse => WorkerFetchOutput::new(target, OutcomeKind::NoResponse),
        FetchOutcome::NetworkError(message) => {
            let mut output = WorkerFetchOutput::new(target, OutcomeKind::NetworkError);
            output.error = Some(message);
            output
        }
    };

    if params.settle {
        output.settled = worker.settle().await;
    }

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::{ORIGIN, FakeNetwork, activated_worker, output, worker};

    fn params(url: &str) -> WorkerFetchParams {
        WorkerFetchParams { url: url.into(), method: default_method(), headers: BTreeMap::new(), settle: true }
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let network = Arc::new(FakeNetwork::new());
        network.serve(&format!("{ORIGIN}/history"), 200, "history");
        let worker = worker(network).await;

        let out: WorkerFetchOutput = output(&fetch_impl(&worker, params("/history")).await.unwrap());
        assert_eq!(out.outcome, OutcomeKind::Passthrough);
        assert_eq!(out.reason, Some(PassthroughReason::NotActivated));
        assert_eq!(out.status, Some(200));
        assert_eq!(out.settled, 0);
    }

    #[tokio::test]
    async fn test_api_request_passes_through() {
        let network = Arc::new(FakeNetwork::new());
        network.serve(&format!("{ORIGIN}/api/moods"), 200, "[]");
        let worker = activated_worker(network).await;

        let out: WorkerFetchOutput = output(&fetch_impl(&worker, params("/api/moods")).await.unwrap());
        assert_eq!(out.reason, Some(PassthroughReason::ApiRequest));
        assert_eq!(out.body.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_static_asset_served_from_cache() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;

        let out: WorkerFetchOutput = output(&fetch_impl(&worker, params("/css/styles.css")).await.unwrap());
        assert_eq!(out.outcome, OutcomeKind::Response);
        assert_eq!(out.source, Some(ResponseSource::Cache));
        assert_eq!(out.body.as_deref(), Some("<h1>Moodify</h1>"));
    }

    #[tokio::test]
    async fn test_dynamic_then_offline() {
        let network = Arc::new(FakeNetwork::new());
        network.serve(&format!("{ORIGIN}/history"), 200, "history");
        let worker = activated_worker(network.clone()).await;

        let online: WorkerFetchOutput = output(&fetch_impl(&worker, params("/history")).await.unwrap());
        assert_eq!(online.source, Some(ResponseSource::Network));
        assert_eq!(online.settled, 1);

        network.set_online(false);
        let cached: WorkerFetchOutput = output(&fetch_impl(&worker, params("/history")).await.unwrap());
        assert_eq!(cached.source, Some(ResponseSource::Cache));
        assert_eq!(cached.body.as_deref(), Some("history"));

        let missing: WorkerFetchOutput = output(&fetch_impl(&worker, params("/stats")).await.unwrap());
        assert_eq!(missing.outcome, OutcomeKind::NoResponse);
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let worker = activated_worker(Arc::new(FakeNetwork::new())).await;
        assert!(fetch_impl(&worker, params("ftp://moodify.example/file")).await.is_err());
    }
}
