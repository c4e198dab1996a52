use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::utils::truncate_chars;

/// Largest datagram read in one call; longer datagrams are truncated
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// Characters of decoded text shown in the console preview
pub const PREVIEW_CHARS: usize = 100;

/// Raw bytes shown (hex encoded) when the payload is not UTF-8
pub const PREVIEW_BYTES: usize = 50;

/// Console preview of a payload.
///
/// Uses strict UTF-8 decoding and falls back to hex. This is independent of
/// the lossy decoding used for the echoed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadPreview {
    /// First characters of a valid UTF-8 payload
    Text(String),
    /// Hex encoding of the first raw bytes of a non-UTF-8 payload
    Binary(String),
}

impl PayloadPreview {
    pub fn of(payload: &[u8]) -> Self {
        match std::str::from_utf8(payload) {
            Ok(text) => PayloadPreview::Text(truncate_chars(text, PREVIEW_CHARS).to_string()),
            Err(_) => {
                let end = payload.len().min(PREVIEW_BYTES);
                PayloadPreview::Binary(hex::encode(&payload[..end]))
            }
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, PayloadPreview::Text(_))
    }
}

impl fmt::Display for PayloadPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadPreview::Text(text) => write!(f, "Message: {}", text),
            PayloadPreview::Binary(hex) => write!(f, "Binary data: {}...", hex),
        }
    }
}

/// What was received for one datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpPacketRecord {
    pub source: SocketAddr,
    pub length: usize,
    pub preview: PayloadPreview,
    pub packet_number: u64,
}

impl UdpPacketRecord {
    pub fn new(source: SocketAddr, payload: &[u8], packet_number: u64) -> Self {
        Self {
            source,
            length: payload.len(),
            preview: PayloadPreview::of(payload),
            packet_number,
        }
    }
}

/// Reply datagram sent back to the sender
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EchoResponse {
    /// Server name
    pub server: String,

    /// Time the reply was built
    pub timestamp: String,

    /// Sequence number of the datagram, starting at 1
    pub packet_number: u64,

    /// Length of the received payload
    pub received_bytes: usize,

    /// Payload decoded as UTF-8 with invalid sequences replaced
    pub echo: String,
}

impl EchoResponse {
    pub fn new(server: &str, timestamp: String, packet_number: u64, payload: &[u8]) -> Self {
        Self {
            server: server.to_string(),
            timestamp,
            packet_number,
            received_bytes: payload.len(),
            echo: String::from_utf8_lossy(payload).into_owned(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
