use std::net::SocketAddr;

use thiserror::Error;

/// Backend error types
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    BindError {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP server error: {0}")]
    ServerError(#[from] hyper::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BackendError::ConfigError(_) => 2,
            _ => 1,
        }
    }
}

/// Configuration specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid address {host}:{port}: {reason}")]
    InvalidAddress {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Host {0} did not resolve to any address")]
    UnresolvedHost(String),

    #[error("Invalid server name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
}
