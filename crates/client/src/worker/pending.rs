//! Detached cache writes.
//!
//! The fetch path hands a response clone to [`PendingWrites::spawn_put`] and
//! returns without waiting. Each write runs as its own task with its own
//! error boundary: a failed write is logged and never reaches the caller.
//! [`PendingWrites::settle`] waits for everything spawned so far, which is
//! how the host keeps the worker alive until writes land.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;

use swcache_core::{CacheDb, Request, Response};

/// Tracker for in-flight cache writes.
#[derive(Clone, Default)]
pub struct PendingWrites {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `partition` and store the response there, in the background.
    pub fn spawn_put(&self, db: &CacheDb, partition: &str, request: Request, response: Response) {
        let db = db.clone();
        let partition = partition.to_string();
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);

        // Reap finished writes so the set only holds in-flight ones.
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            let result = match db.open_partition(&partition).await {
                Ok(handle) => handle.put(&request, &response).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => tracing::debug!(partition = %partition, url = %request.url, "cached response"),
                Err(e) => tracing::warn!(partition = %partition, url = %request.url, error = %e, "cache write failed"),
            }
        });
    }

    /// Number of writes spawned and not yet reaped.
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every write spawned so far. Returns how many were awaited.
    pub async fn settle(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        let mut settled = 0;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "cache write task aborted");
            }
            settled += 1;
        }
        settled
    }
}
