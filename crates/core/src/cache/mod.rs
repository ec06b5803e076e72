//! SQLite-backed cache storage made of named partitions.
//!
//! Async access goes through tokio-rusqlite. It supports:
//!
//! - Named partitions created on first open and deleted as a unit
//! - Request-identity keys (SHA-256 over method and URL)
//! - Last-write-wins upserts, atomic per write
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod partition;

pub use crate::Error;

pub use connection::CacheDb;
pub use partition::{CachedEntry, Partition, PartitionInfo};
