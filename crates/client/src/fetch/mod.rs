//! Network fetch boundary.
//!
//! The router only sees the [`Network`] trait: a fetch either resolves with
//! a response (any status, including 4xx/5xx) or rejects with
//! `Error::Network` (offline, DNS failure, connection reset, timeout).
//! [`FetchClient`] is the reqwest-backed implementation.

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::{Client, Method, header};

use swcache_core::{Error, Headers, Request, Response, WorkerConfig};

/// Network collaborator used by the router and the install step.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. `Err` means the fetch rejected; an HTTP error
    /// status is still `Ok`.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Request timeout; `None` waits indefinitely (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "swcache/0.1".to_string(), timeout: None, max_redirects: 5 }
    }
}

impl From<&WorkerConfig> for FetchConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), max_redirects: config.max_redirects }
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

fn to_method(method: &str) -> Result<Method, Error> {
    Method::from_bytes(method.as_bytes()).map_err(|_| Error::InvalidInput(format!("invalid method: {method}")))
}

fn to_headers(map: &header::HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
        .collect()
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let mut builder = self.http.request(to_method(request.method())?, request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} {}: {e}", request.method(), request.url)))?;

        let status = response.status().as_u16();
        let headers = to_headers(response.headers());

        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response body: {e}")))?;

        tracing::debug!(
            method = request.method(),
            url = %request.url,
            status,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "network fetch finished"
        );

        Ok(Response { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_worker_config() {
        let worker = WorkerConfig { timeout_ms: Some(1500), user_agent: "moodify-sw".into(), ..Default::default() };
        let config = FetchConfig::from(&worker);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.user_agent, "moodify-sw");
    }

    #[test]
    fn test_to_method() {
        assert_eq!(to_method("GET").unwrap(), Method::GET);
        assert!(to_method("BAD METHOD").is_err());
    }

    #[test]
    fn test_to_headers_lowercases() {
        let mut map = header::HeaderMap::new();
        map.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/html"));
        let headers = to_headers(&map);
        assert_eq!(headers.get("Content-Type"), Some("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_when_unreachable() {
        let client = FetchClient::new(FetchConfig { timeout: Some(Duration::from_secs(2)), ..Default::default() })
            .unwrap();
        let request = Request::get(url::Url::parse("http://127.0.0.1:9/").unwrap());
        let result = client.fetch(&request).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
