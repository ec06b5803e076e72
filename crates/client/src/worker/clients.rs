//! Open application instances (windows) the worker can control.

use std::sync::Mutex;
use std::sync::PoisonError;

use serde::{Deserialize, Serialize};
use url::Url;

use swcache_core::Error;

/// One open application window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Client {
    pub id: String,
    pub url: String,
    /// Whether this worker controls the window's requests.
    pub controlled: bool,
    pub focused: bool,
}

/// How `open_or_focus` satisfied the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowOutcome {
    Focused { client: Client },
    Opened { client: Client },
}

#[derive(Debug, Default)]
struct Inner {
    clients: Vec<Client>,
    next_id: u64,
}

impl Inner {
    fn focus_only(&mut self, id: &str) -> Option<Client> {
        let index = self.clients.iter().position(|c| c.id == id)?;
        for client in &mut self.clients {
            client.focused = false;
        }
        self.clients[index].focused = true;
        Some(self.clients[index].clone())
    }

    fn push(&mut self, url: &Url, controlled: bool, focused: bool) -> Client {
        self.next_id += 1;
        if focused {
            for client in &mut self.clients {
                client.focused = false;
            }
        }
        let client = Client { id: format!("client-{}", self.next_id), url: url.to_string(), controlled, focused };
        self.clients.push(client.clone());
        client
    }
}

/// Registry of open windows.
#[derive(Debug, Default)]
pub struct Clients {
    inner: Mutex<Inner>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a window that was opened outside the worker.
    ///
    /// It stays uncontrolled until the next `claim`.
    pub fn register(&self, url: &Url) -> Client {
        self.lock().push(url, false, false)
    }

    pub fn list(&self) -> Vec<Client> {
        self.lock().clients.clone()
    }

    /// Forget a window that was closed.
    pub fn remove(&self, id: &str) -> Result<Client, Error> {
        let mut inner = self.lock();
        let index = inner
            .clients
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::ClientNotFound(id.to_string()))?;
        Ok(inner.clients.remove(index))
    }

    /// Take control of every open window. Returns how many changed hands.
    pub fn claim(&self) -> usize {
        let mut inner = self.lock();
        let mut claimed = 0;
        for client in inner.clients.iter_mut().filter(|c| !c.controlled) {
            client.controlled = true;
            claimed += 1;
        }
        claimed
    }

    pub fn focus(&self, id: &str) -> Result<Client, Error> {
        self.lock().focus_only(id).ok_or_else(|| Error::ClientNotFound(id.to_string()))
    }

    /// Open a new focused, controlled window at `url`.
    pub fn open_window(&self, url: &Url) -> Client {
        self.lock().push(url, true, true)
    }

    /// Focus a window already showing `url`, or open one.
    pub fn open_or_focus(&self, url: &Url) -> WindowOutcome {
        let mut inner = self.lock();
        let existing = inner.clients.iter().find(|c| c.url == url.as_str()).map(|c| c.id.clone());
        match existing.and_then(|id| inner.focus_only(&id)) {
            Some(client) => WindowOutcome::Focused { client },
            None => WindowOutcome::Opened { client: inner.push(url, true, true) },
        }
    }
}
