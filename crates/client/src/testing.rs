//! Scripted network for tests of the worker and of crates built on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use swcache_core::{Error, Headers, Request, Response};

use crate::fetch::Network;

/// Fixed responses per URL, 404 for anything else, and an offline switch
/// that makes every fetch reject.
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl Default for FakeNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self { routes: Mutex::new(HashMap::new()), online: AtomicBool::new(true), calls: Mutex::new(Vec::new()) }
    }

    pub fn serve(&self, url: &str, status: u16, body: &'static str) {
        self.serve_response(url, Response::new(status, Headers::new(), body));
    }

    pub fn serve_response(&self, url: &str, response: Response) {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).insert(url.to_string(), response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of fetches attempted, including rejected ones.
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait::async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(request.url.to_string());
        if !self.online.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404, Headers::new(), "not found")))
    }
}
