//! Unified error types for swcache.
//!
//! Each variant carries a stable code prefix so failures read the same in
//! logs and in tool responses.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the caching worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., malformed push payload).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// No cache entry or partition found.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// The network fetch rejected (offline, DNS failure, connection reset).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// A response arrived with a status the operation cannot accept.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Static asset population failed.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// Lifecycle event arrived in a state that cannot handle it.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    /// No open client with the given id.
    #[error("CLIENT_NOT_FOUND: {0}")]
    ClientNotFound(String),

    /// No displayed notification with the given id.
    #[error("NOTIFICATION_NOT_FOUND: {0}")]
    NotificationNotFound(u64),

    /// Background sync routine failed.
    #[error("SYNC_FAILED: {0}")]
    SyncFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32602, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
            Error::Network(msg) => (-32003, msg.clone()),
            Error::HttpError(msg) => (-32004, msg.clone()),
            Error::InstallFailed(msg) => (-32005, msg.clone()),
            Error::InvalidState(msg) => (-32006, msg.clone()),
            Error::ClientNotFound(id) => (-32007, format!("no client with id {id}")),
            Error::NotificationNotFound(id) => (-32008, format!("no notification with id {id}")),
            Error::SyncFailed(msg) => (-32009, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("moodify-static-v1.0.0".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("moodify-static-v1.0.0"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::Network("connection refused".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32003);
    }

    #[test]
    fn test_notification_not_found_message() {
        let mcp_err: McpError = Error::NotificationNotFound(7).into();
        assert_eq!(mcp_err.code.0, -32008);
        assert!(mcp_err.message.contains('7'));
    }
}
