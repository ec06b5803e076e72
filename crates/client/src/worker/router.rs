//! Fetch interception.
//!
//! [`CacheRouter::route`] applies the routing policy to one request and
//! runs the chosen strategy:
//!
//! - **cache-first** for static assets: serve a cached copy, otherwise fetch
//!   and store a `200` into the static partition.
//! - **network-first** for everything else: fetch and store a `200` into the
//!   dynamic partition; when the fetch rejects, fall back to any cached copy,
//!   then to the cached root document for HTML requests, then to no response.
//!
//! Stores are detached ([`PendingWrites`]); the response never waits on them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use swcache_core::policy::{self, OfflineFallback, PassthroughReason, Route, StaticManifest};
use swcache_core::{CacheDb, ConfigError, Request, Response, WorkerConfig};

use super::pending::PendingWrites;
use crate::fetch::Network;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// The cached root document served for an HTML request while offline.
    OfflineFallback,
}

/// Result of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself.
    Passthrough(PassthroughReason),
    Response { response: Response, source: ResponseSource },
    /// Network failed and nothing cached could stand in.
    NoResponse,
    /// Cache-first miss whose network fetch rejected.
    NetworkError(String),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Response { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Response { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Request-intercepting policy engine over the two current partitions.
pub struct CacheRouter {
    manifest: StaticManifest,
    api_prefix: String,
    static_cache: String,
    dynamic_cache: String,
    root: Request,
    db: CacheDb,
    network: Arc<dyn Network>,
    pending: PendingWrites,
}

impl CacheRouter {
    pub fn new(
        config: &WorkerConfig, db: CacheDb, network: Arc<dyn Network>, pending: PendingWrites,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            manifest: config.manifest()?,
            api_prefix: config.api_prefix.clone(),
            static_cache: config.static_cache_name(),
            dynamic_cache: config.dynamic_cache_name(),
            root: config.root_request()?,
            db,
            network,
            pending,
        })
    }

    /// Decide and run the strategy for one request.
    pub async fn route(&self, request: &Request) -> FetchOutcome {
        match policy::classify(request, &self.manifest, &self.api_prefix) {
            Route::Passthrough(reason) => {
                tracing::debug!(method = request.method(), url = %request.url, ?reason, "not intercepted");
                FetchOutcome::Passthrough(reason)
            }
            Route::CacheFirst => self.cache_first(request).await,
            Route::NetworkFirst => self.network_first(request).await,
        }
    }

    /// Cross-partition lookup; read failures count as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.db.match_request(request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    fn store_detached(&self, partition: &str, request: &Request, response: &Response) {
        if policy::should_store(response) {
            self.pending.spawn_put(&self.db, partition, request.clone(), response.clone());
        }
    }

    async fn cache_first(&self, request: &Request) -> FetchOutcome {
        if let Some(cached) = self.lookup(request).await {
            tracing::debug!(url = %request.url, "static cache hit");
            return FetchOutcome::Response { response: cached, source: ResponseSource::Cache };
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_detached(&self.static_cache, request, &response);
                FetchOutcome::Response { response, source: ResponseSource::Network }
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "static asset fetch failed");
                FetchOutcome::NetworkError(e.to_string())
            }
        }
    }

    async fn network_first(&self, request: &Request) -> FetchOutcome {
        let error = match self.network.fetch(request).await {
            Ok(response) => {
                self.store_detached(&self.dynamic_cache, request, &response);
                return FetchOutcome::Response { response, source: ResponseSource::Network };
            }
            Err(e) => e,
        };

        tracing::debug!(url = %request.url, error = %error, "network failed, trying cache");

        if let Some(cached) = self.lookup(request).await {
            return FetchOutcome::Response { response: cached, source: ResponseSource::Cache };
        }

        match policy::offline_fallback(request) {
            OfflineFallback::RootDocument => match self.lookup(&self.root).await {
                Some(page) => FetchOutcome::Response { response: page, source: ResponseSource::OfflineFallback },
                None => FetchOutcome::NoResponse,
            },
            OfflineFallback::NoResponse => FetchOutcome::NoResponse,
        }
    }
}
