use std::sync::Arc;

use clap::Parser;

use aegis_test_backends::config::{UdpEchoArgs, UdpEchoConfig};
use aegis_test_backends::logging::{init_tracing, StdoutLog};
use aegis_test_backends::udp_echo::run_udp_echo;

#[tokio::main]
async fn main() {
    let config = UdpEchoConfig::from(UdpEchoArgs::parse());
    init_tracing(&config.logging);

    if let Err(e) = run_udp_echo(config, Arc::new(StdoutLog)).await {
        tracing::error!(error = %e, "UDP echo backend failed");
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
