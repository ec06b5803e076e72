//! Routing policy as pure decision functions.
//!
//! Nothing here touches the network or the cache; the router feeds in the
//! request and what it observed, and acts on the returned decision.
//!
//! Decision order for an intercepted request (first match wins):
//! 1. non-GET method: passthrough
//! 2. path under the API prefix: passthrough
//! 3. path or absolute URL listed in the static manifest: cache-first
//! 4. everything else: network-first

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::{Request, Response};

/// Why a request was left to the host instead of being intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassthroughReason {
    /// Method other than GET.
    NonGet,
    /// Path starts with the reserved API prefix.
    ApiRequest,
    /// The worker is not active yet, so it controls no requests.
    NotActivated,
}

/// Strategy chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough(PassthroughReason),
    CacheFirst,
    NetworkFirst,
}

/// What to serve once the network-first fetch rejected and the request
/// itself had no cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineFallback {
    /// Serve the cached root document.
    RootDocument,
    /// Resolve with no response at all.
    NoResponse,
}

/// The static asset list, kept in the two forms it is matched in.
///
/// Built from resolved URLs: entries on the application origin match any
/// request with the same path, entries on another origin (e.g. a CDN script)
/// match only the exact serialized URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticManifest {
    paths: Vec<String>,
    urls: Vec<String>,
}

impl StaticManifest {
    pub fn new<I>(origin: &Url, assets: I) -> Self
    where
        I: IntoIterator<Item = Url>,
    {
        let (mut paths, mut urls) = (Vec::new(), Vec::new());
        for asset in assets {
            if asset.origin() == origin.origin() {
                paths.push(asset.path().to_string());
            } else {
                urls.push(asset.to_string());
            }
        }
        Self { paths, urls }
    }

    pub fn contains(&self, url: &Url) -> bool {
        let path = url.path();
        let full = url.as_str();
        self.paths.iter().any(|p| p == path) || self.urls.iter().any(|u| u == full)
    }
}

/// Decide how a request is handled.
pub fn classify(request: &Request, manifest: &StaticManifest, api_prefix: &str) -> Route {
    if !request.is_get() {
        return Route::Passthrough(PassthroughReason::NonGet);
    }

    if request.url.path().starts_with(api_prefix) {
        return Route::Passthrough(PassthroughReason::ApiRequest);
    }

    if manifest.contains(&request.url) {
        return Route::CacheFirst;
    }

    Route::NetworkFirst
}

/// Whether a network response may be written to a partition.
///
/// Only plain `200 OK` is stored; partial content, redirects and errors
/// always go back to the caller uncached.
pub fn should_store(response: &Response) -> bool {
    response.status == 200
}

/// Pick the last-resort fallback for a request with no cache entry.
pub fn offline_fallback(request: &Request) -> OfflineFallback {
    if request.accepts_html() { OfflineFallback::RootDocument } else { OfflineFallback::NoResponse }
}
