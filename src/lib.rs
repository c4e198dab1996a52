// Aegis test backends library

pub mod config;
pub mod error;
pub mod http_backend;
pub mod logging;
pub mod udp_echo;
pub mod utils;

// Re-export commonly used types
pub use config::{HttpBackendConfig, ServerIdentity, UdpEchoConfig};
pub use error::{BackendError, ConfigError};
pub use logging::{CapturedLog, ConsoleLog, StdoutLog};
