use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::ServerIdentity;
use crate::logging::ConsoleLog;
use crate::udp_echo::packet::{EchoResponse, UdpPacketRecord};
use crate::utils::iso8601_now;

/// Per-datagram processing for the echo server.
///
/// Owns the packet counter; the receive loop is its only caller, so the
/// counter is a plain integer.
pub struct EchoSession {
    identity: ServerIdentity,
    packets_handled: u64,
    log: Arc<dyn ConsoleLog>,
}

impl EchoSession {
    pub fn new(identity: ServerIdentity, log: Arc<dyn ConsoleLog>) -> Self {
        Self {
            identity,
            packets_handled: 0,
            log,
        }
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    /// Number of datagrams received so far
    pub fn packets_handled(&self) -> u64 {
        self.packets_handled
    }

    /// Record one datagram and build the reply bytes for it
    pub fn process(
        &mut self,
        payload: &[u8],
        source: SocketAddr,
    ) -> Result<(UdpPacketRecord, Vec<u8>), serde_json::Error> {
        self.packets_handled += 1;
        let record = UdpPacketRecord::new(source, payload, self.packets_handled);

        self.log.line(&format!(
            "[{}] [{}] Received {} bytes from {}",
            iso8601_now(),
            self.identity,
            record.length,
            record.source
        ));
        self.log.line(&format!("  {}", record.preview));

        let response = EchoResponse::new(
            self.identity.as_str(),
            iso8601_now(),
            record.packet_number,
            payload,
        );
        let reply = response.to_bytes()?;

        tracing::debug!(
            packet_number = record.packet_number,
            source = %record.source,
            received = record.length,
            text = record.preview.is_text(),
            "Processed datagram"
        );

        Ok((record, reply))
    }

    /// Note a reply that was handed to the socket
    pub fn record_sent(&self, sent: usize) {
        self.log.line(&format!("  Echoed {} bytes back\n", sent));
    }
}
