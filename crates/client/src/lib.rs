//! Worker runtime for swcache.
//!
//! This crate provides the network fetch boundary and the caching worker
//! (lifecycle, request routing, sync and notifications) used by the server.

pub mod fetch;
pub mod worker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use worker::{
    ActivateReport, CacheRouter, ClickOutcome, Client, Clients, FetchOutcome, InstallReport, Notification,
    NotificationCenter, PendingWrites, PushPayload, ResponseSource, SyncOutcome, WindowOutcome, Worker, WorkerState,
    WorkerStatus,
};
