//! Cache inspection MCP tools.
//!
//! This module provides tools for listing, reading and deleting partitions
//! in the SQLite cache.

pub mod delete;
pub mod get;
pub mod keys;

pub use delete::{CacheDeleteParams, delete_impl};
pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
