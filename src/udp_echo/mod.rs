pub mod packet;
pub mod server;
pub mod session;

pub use packet::{EchoResponse, PayloadPreview, UdpPacketRecord, MAX_DATAGRAM_SIZE};
pub use server::{run_udp_echo, run_udp_echo_until, UdpEchoServer};
pub use session::EchoSession;
