use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use clap::Parser;
use hyper::header::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Label embedded in every response so a proxy test can tell which backend
/// instance answered. Fixed at startup; cloning shares the same string.
///
/// The name is also sent as the `X-Backend-Server` header, so it must be a
/// valid header value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerIdentity(Arc<str>);

impl ServerIdentity {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if let Err(e) = HeaderValue::from_str(&name) {
            return Err(ConfigError::InvalidName {
                name,
                reason: e.to_string(),
            });
        }
        Ok(Self(Arc::from(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ServerIdentity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is not set
    pub level: String,

    /// Whether to emit diagnostics as JSON
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// HTTP test backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpBackendConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Server name reported in every response
    pub name: String,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            name: "backend".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HttpBackendConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        resolve(&self.host, self.port)
    }

    pub fn identity(&self) -> Result<ServerIdentity, ConfigError> {
        ServerIdentity::new(self.name.clone())
    }
}

/// UDP echo backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpEchoConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Server name reported in every reply
    pub name: String,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for UdpEchoConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            name: "udp-backend".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl UdpEchoConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        resolve(&self.host, self.port)
    }

    pub fn identity(&self) -> Result<ServerIdentity, ConfigError> {
        ServerIdentity::new(self.name.clone())
    }
}

/// Resolve `host:port` into the first matching socket address.
fn resolve(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| ConfigError::InvalidAddress {
            host: host.to_string(),
            port,
            reason: e.to_string(),
        })?;

    addrs
        .next()
        .ok_or_else(|| ConfigError::UnresolvedHost(host.to_string()))
}

/// Command line for the HTTP test backend
#[derive(Debug, Parser)]
#[command(name = "http_backend")]
#[command(about = "Simple HTTP server for Aegis proxy testing")]
pub struct HttpBackendArgs {
    /// Port to listen on
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    /// Server name
    #[arg(long, default_value = "backend")]
    pub name: String,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Diagnostic log level (RUST_LOG takes precedence)
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    /// Emit diagnostics as JSON
    #[arg(long = "log-json", default_value_t = false)]
    pub log_json: bool,
}

impl From<HttpBackendArgs> for HttpBackendConfig {
    fn from(args: HttpBackendArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            name: args.name,
            logging: LoggingConfig {
                level: args.log_level,
                json_format: args.log_json,
            },
        }
    }
}

/// Command line for the UDP echo backend
#[derive(Debug, Parser)]
#[command(name = "udp_echo")]
#[command(about = "Simple UDP echo server for Aegis proxy testing")]
pub struct UdpEchoArgs {
    /// Port to listen on
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Server name
    #[arg(long, default_value = "udp-backend")]
    pub name: String,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Diagnostic log level (RUST_LOG takes precedence)
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    /// Emit diagnostics as JSON
    #[arg(long = "log-json", default_value_t = false)]
    pub log_json: bool,
}

impl From<UdpEchoArgs> for UdpEchoConfig {
    fn from(args: UdpEchoArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            name: args.name,
            logging: LoggingConfig {
                level: args.log_level,
                json_format: args.log_json,
            },
        }
    }
}
