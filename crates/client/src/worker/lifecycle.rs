//! Install and activate.
//!
//! Install populates the static partition all-or-nothing and never fails
//! the install itself; activate drops every partition that does not belong
//! to the current version and claims open windows.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use swcache_core::{Error, Request, Response};

use super::{Worker, WorkerState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub static_cache: String,
    /// Number of assets in the static list.
    pub requested: usize,
    /// Number of assets stored; either all of them or zero.
    pub cached: usize,
    /// Why population failed, if it did. The install still completed.
    pub error: Option<String>,
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    /// Windows that came under this worker's control.
    pub claimed: usize,
}

impl Worker {
    /// Handle the install event.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` while another install or an activation
    /// is running. Population failures are reported, not returned.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(&[WorkerState::Parsed, WorkerState::Installed, WorkerState::Activated], WorkerState::Installing)
            .await?;
        tracing::info!(version = %self.config.cache_version, "worker installing");

        let static_cache = self.config.static_cache_name();
        let requested = self.config.static_assets.len();

        let (cached, error) = match self.populate_static(&static_cache).await {
            Ok(cached) => {
                tracing::info!(partition = %static_cache, cached, "cached static assets");
                (cached, None)
            }
            Err(e) => {
                let error = Error::InstallFailed(e.to_string());
                tracing::warn!(partition = %static_cache, error = %error, "static cache population failed");
                (0, Some(error.to_string()))
            }
        };

        self.skip_waiting();
        self.set_state(WorkerState::Installed).await;

        Ok(InstallReport { static_cache, requested, cached, error, skip_waiting: true })
    }

    async fn populate_static(&self, name: &str) -> Result<usize, Error> {
        let requests = self.config.static_requests().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let partition = self.db.open_partition(name).await?;

        let fetches = requests.into_iter().map(|request| async move {
            let response = self.network.fetch(&request).await?;
            if !response.ok() {
                return Err(Error::HttpError(format!("{} returned status {}", request.url, response.status)));
            }
            Ok::<(Request, Response), Error>((request, response))
        });
        let pairs = try_join_all(fetches).await?;

        let cached = pairs.len();
        partition.put_all(pairs).await?;
        Ok(cached)
    }

    /// Handle the activate event.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` before install has finished, or the
    /// storage error that interrupted the cleanup.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let previous =
            self.transition(&[WorkerState::Installed, WorkerState::Activated], WorkerState::Activating).await?;
        tracing::info!(version = %self.config.cache_version, "worker activating");

        match self.purge_stale_partitions().await {
            Ok((deleted, kept)) => {
                let claimed = self.clients.claim();
                self.set_state(WorkerState::Activated).await;
                tracing::info!(deleted = deleted.len(), claimed, "worker activated");
                Ok(ActivateReport { deleted, kept, claimed })
            }
            Err(e) => {
                self.set_state(previous).await;
                Err(e)
            }
        }
    }

    async fn purge_stale_partitions(&self) -> Result<(Vec<String>, Vec<String>), Error> {
        let mut deleted = Vec::new();
        let mut kept = Vec::new();
        for name in self.db.keys().await? {
            if self.config.is_current_partition(&name) {
                kept.push(name);
            } else {
                tracing::info!(partition = %name, "deleting old cache");
                self.db.delete(&name).await?;
                deleted.push(name);
            }
        }
        Ok((deleted, kept))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::FakeNetwork;
    use swcache_core::{CacheDb, WorkerConfig};
    use url::Url;

    const ORIGIN: &str = "https://moodify.example";
    const CDN: &str = "https://cdnjs.cloudflare.com/ajax/libs/Chart.js/3.9.1/chart.min.js";

    fn serve_all_assets(network: &FakeNetwork) {
        for path in ["/", "/index.html", "/css/styles.css", "/js/script.js"] {
            network.serve(&format!("{ORIGIN}{path}"), 200, "asset");
        }
        network.serve(CDN, 200, "chart");
    }

    async fn worker(network: Arc<FakeNetwork>) -> Worker {
        let config = WorkerConfig { origin: ORIGIN.into(), ..Default::default() };
        let db = CacheDb::open_in_memory().await.unwrap();
        Worker::new(config, db, network).unwrap()
    }

    #[tokio::test]
    async fn test_install_caches_every_asset() {
        let network = Arc::new(FakeNetwork::new());
        serve_all_assets(&network);
        let worker = worker(network.clone()).await;

        let report = worker.install().await.unwrap();
        assert_eq!(report.static_cache, "moodify-static-v1.0.0");
        assert_eq!(report.cached, 5);
        assert!(report.error.is_none());
        assert!(report.skip_waiting);
        assert_eq!(worker.state().await, WorkerState::Installed);
        assert_eq!(network.calls(), 5);

        let partition = worker.db().open_partition("moodify-static-v1.0.0").await.unwrap();
        assert_eq!(partition.len().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let network = Arc::new(FakeNetwork::new());
        serve_all_assets(&network);
        network.serve(&format!("{ORIGIN}/js/script.js"), 500, "boom");
        let worker = worker(network).await;

        let report = worker.install().await.unwrap();
        assert_eq!(report.cached, 0);
        assert!(report.error.as_deref().unwrap().starts_with("INSTALL_FAILED"));
        assert_eq!(worker.state().await, WorkerState::Installed);

        let partition = worker.db().open_partition("moodify-static-v1.0.0").await.unwrap();
        assert_eq!(partition.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_install_offline_still_installs() {
        let network = Arc::new(FakeNetwork::new());
        network.set_online(false);
        let worker = worker(network).await;

        let report = worker.install().await.unwrap();
        assert!(report.error.is_some());
        assert!(worker.activate().await.is_ok());
        assert_eq!(worker.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_before_install_rejected() {
        let worker = worker(Arc::new(FakeNetwork::new())).await;
        assert!(matches!(worker.activate().await, Err(Error::InvalidState(_))));
        assert_eq!(worker.state().await, WorkerState::Parsed);
    }

    #[tokio::test]
    async fn test_activate_deletes_only_old_partitions() {
        let network = Arc::new(FakeNetwork::new());
        serve_all_assets(&network);
        let worker = worker(network).await;
        let db = worker.db().clone();
        for name in ["moodify-static-v0.9.0", "moodify-dynamic-v0.9.0", "moodify-dynamic-v1.0.0"] {
            db.open_partition(name).await.unwrap();
        }

        worker.install().await.unwrap();
        let report = worker.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["moodify-static-v0.9.0".to_string(), "moodify-dynamic-v0.9.0".to_string()]);
        assert_eq!(report.kept.len(), 2);
        assert!(report.kept.contains(&"moodify-static-v1.0.0".to_string()));
        assert!(report.kept.contains(&"moodify-dynamic-v1.0.0".to_string()));
        assert_eq!(db.keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_activate_claims_open_windows() {
        let worker = worker(Arc::new(FakeNetwork::new())).await;
        worker.clients().register(&Url::parse(ORIGIN).unwrap());
        worker.clients().register(&Url::parse(&format!("{ORIGIN}/history")).unwrap());

        worker.install().await.unwrap();
        let report = worker.activate().await.unwrap();
        assert_eq!(report.claimed, 2);
        assert!(worker.clients().list().iter().all(|c| c.controlled));
    }
}
