//! swcache server entry point.
//!
//! Boots the caching worker and exposes its event surface as MCP tools on
//! the stdio transport. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use swcache_client::{FetchClient, FetchConfig, Worker};
use swcache_core::{CacheDb, WorkerConfig};

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load()?;
    tracing::info!(
        static_cache = %config.static_cache_name(),
        dynamic_cache = %config.dynamic_cache_name(),
        db_path = %config.db_path.display(),
        "Starting swcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(Worker::new(config, db, Arc::new(network))?);

    let handler = handler::SwcacheServer::new(worker.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    let settled = worker.settle().await;
    worker.db().close().await?;
    tracing::info!(settled, "swcache server stopped");

    Ok(())
}
