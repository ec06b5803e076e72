//! The caching worker: lifecycle, fetch routing, sync and notifications.
//!
//! A [`Worker`] owns one version's configuration and reacts to the host's
//! events. Every handler is an `async fn` the host awaits to completion;
//! cache writes started by the fetch path are the exception and are
//! tracked by [`PendingWrites`] so the host can [`Worker::settle`] them.

pub mod clients;
pub mod lifecycle;
pub mod notify;
pub mod pending;
pub mod router;
pub mod sync;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use swcache_core::{CacheDb, ConfigError, Error, PassthroughReason, Request, WorkerConfig};

pub use clients::{Client, Clients, WindowOutcome};
pub use lifecycle::{ActivateReport, InstallReport};
pub use notify::{ClickAction, Notification, NotificationCenter, NotificationOptions, PushPayload};
pub use pending::PendingWrites;
pub use router::{CacheRouter, FetchOutcome, ResponseSource};
pub use sync::SyncOutcome;

use crate::fetch::Network;

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Snapshot of the worker for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub skip_waiting: bool,
    pub static_cache: String,
    pub dynamic_cache: String,
    pub pending_writes: usize,
    pub clients: usize,
    pub notifications: usize,
}

/// Result of a notification click.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ClickOutcome {
    pub closed: Notification,
    /// Window focused or opened by the `explore` action.
    pub window: Option<WindowOutcome>,
}

pub struct Worker {
    config: Arc<WorkerConfig>,
    db: CacheDb,
    network: Arc<dyn Network>,
    router: CacheRouter,
    pending: PendingWrites,
    clients: Clients,
    notifications: NotificationCenter,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
}

impl Worker {
    pub fn new(config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, ConfigError> {
        config.validate()?;
        let pending = PendingWrites::new();
        let router = CacheRouter::new(&config, db.clone(), network.clone(), pending.clone())?;
        Ok(Self {
            config: Arc::new(config),
            db,
            network,
            router,
            pending,
            clients: Clients::new(),
            notifications: NotificationCenter::new(),
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// The network the worker fetches through, for requests it does not
    /// intercept.
    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, next: WorkerState) {
        *self.state.write().await = next;
    }

    /// Move to `next` if the current state is one of `from`; returns the
    /// state that was left.
    async fn transition(&self, from: &[WorkerState], next: WorkerState) -> Result<WorkerState, Error> {
        let mut state = self.state.write().await;
        let current = *state;
        if !from.contains(&current) {
            return Err(Error::InvalidState(format!("cannot enter {next:?} from {current:?}")));
        }
        *state = next;
        Ok(current)
    }

    fn skip_waiting(&self) {
        if !self.skip_waiting.swap(true, Ordering::SeqCst) {
            tracing::debug!("skip waiting requested");
        }
    }

    /// Handle a fetch event. Only an activated worker intercepts.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if self.state().await != WorkerState::Activated {
            return FetchOutcome::Passthrough(PassthroughReason::NotActivated);
        }
        self.router.route(request).await
    }

    /// Handle a sync event.
    pub async fn handle_sync(&self, tag: &str) -> SyncOutcome {
        sync::handle_sync(tag, sync::run_background_sync).await
    }

    /// Handle a push event carrying an optional JSON body.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the body is not a JSON object.
    pub async fn handle_push(&self, data: Option<&str>) -> Result<Option<Notification>, Error> {
        let Some(payload) = notify::parse_push(data)? else {
            tracing::debug!("push without data, nothing to show");
            return Ok(None);
        };

        let options = NotificationOptions::for_push(&payload, chrono::Utc::now());
        let notification = self.notifications.show(payload.title, options);
        tracing::info!(id = notification.id, title = %notification.title, "showing notification");
        Ok(Some(notification))
    }

    /// Handle a notification click.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotificationNotFound` if no such notification is shown.
    pub async fn handle_notification_click(&self, id: u64, action: Option<&str>) -> Result<ClickOutcome, Error> {
        let closed = self.notifications.close(id).ok_or(Error::NotificationNotFound(id))?;

        let window = match ClickAction::from(action) {
            ClickAction::Explore => {
                let root = self.config.root_request().map_err(|e| Error::InvalidUrl(e.to_string()))?;
                Some(self.clients.open_or_focus(&root.url))
            }
            ClickAction::Close | ClickAction::Default | ClickAction::Other(_) => None,
        };

        tracing::debug!(id, ?action, opened = window.is_some(), "notification clicked");
        Ok(ClickOutcome { closed, window })
    }

    /// Wait for all detached cache writes.
    pub async fn settle(&self) -> usize {
        self.pending.settle().await
    }

    pub async fn status(&self) -> WorkerStatus {
        WorkerStatus {
            state: self.state().await,
            skip_waiting: self.skip_waiting.load(Ordering::SeqCst),
            static_cache: self.config.static_cache_name(),
            dynamic_cache: self.config.dynamic_cache_name(),
            pending_writes: self.pending.len(),
            clients: self.clients.list().len(),
            notifications: self.notifications.list().len(),
        }
    }
}
