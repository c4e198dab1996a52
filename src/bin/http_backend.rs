use std::sync::Arc;

use clap::Parser;

use aegis_test_backends::config::{HttpBackendArgs, HttpBackendConfig};
use aegis_test_backends::http_backend::run_http_backend;
use aegis_test_backends::logging::{init_tracing, StdoutLog};

#[tokio::main]
async fn main() {
    let config = HttpBackendConfig::from(HttpBackendArgs::parse());
    init_tracing(&config.logging);

    if let Err(e) = run_http_backend(config, Arc::new(StdoutLog)).await {
        tracing::error!(error = %e, "HTTP backend failed");
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
