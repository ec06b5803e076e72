//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Partitioned response cache with SQLite backend
//! - Request/response model
//! - Pure routing policy
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod policy;

pub use cache::{CacheDb, CachedEntry, Partition, PartitionInfo};
pub use config::{ConfigError, WorkerConfig};
pub use error::Error;
pub use http::{Headers, Request, Response};
pub use policy::{OfflineFallback, PassthroughReason, Route, StaticManifest};
