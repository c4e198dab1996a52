use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::config::{ServerIdentity, UdpEchoConfig};
use crate::error::BackendError;
use crate::logging::{banner, print_banner, ConsoleLog};
use crate::udp_echo::packet::MAX_DATAGRAM_SIZE;
use crate::udp_echo::session::EchoSession;
use crate::utils::shutdown_signal;

/// UDP echo backend: one socket, one datagram at a time, in arrival order
pub struct UdpEchoServer {
    socket: UdpSocket,
    session: EchoSession,
}

impl UdpEchoServer {
    pub async fn bind(
        addr: SocketAddr,
        identity: ServerIdentity,
        log: Arc<dyn ConsoleLog>,
    ) -> Result<Self, BackendError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| BackendError::BindError { addr, source })?;

        tracing::info!(%addr, server = %identity, "UDP echo backend bound");

        Ok(Self {
            socket,
            session: EchoSession::new(identity, log),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BackendError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn packets_handled(&self) -> u64 {
        self.session.packets_handled()
    }

    /// Receive and answer datagrams until `shutdown` resolves, then close the
    /// socket and return the number of datagrams handled.
    ///
    /// Shutdown is only observed while waiting for a datagram, so every
    /// counted datagram has had its reply handed to the socket.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<u64, BackendError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            let received = tokio::select! {
                received = self.socket.recv_from(&mut buf) => received,
                _ = &mut shutdown => break,
            };

            let (len, source) = match received {
                Ok(received) => received,
                Err(e) if is_transient(&e) => {
                    tracing::warn!(error = %e, "Ignoring transient receive error");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            self.answer(&buf[..len], source).await?;
        }

        let handled = self.session.packets_handled();
        drop(self.socket);

        Ok(handled)
    }

    /// Process one datagram and send the reply back to its source
    async fn answer(&mut self, payload: &[u8], source: SocketAddr) -> Result<(), BackendError> {
        let (_, reply) = self.session.process(payload, source)?;

        match self.socket.send_to(&reply, source).await {
            Ok(sent) => self.session.record_sent(sent),
            Err(e) if is_transient(&e) => {
                tracing::warn!(%source, error = %e, "Failed to deliver reply");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }
}

/// Errors a peer can cause on a connectionless socket (ICMP unreachable
/// feedback) that leave the socket usable
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
    )
}

/// Run the UDP echo backend until Ctrl+C
pub async fn run_udp_echo(
    config: UdpEchoConfig,
    log: Arc<dyn ConsoleLog>,
) -> Result<(), BackendError> {
    run_udp_echo_until(config, log, shutdown_signal()).await
}

/// Run the UDP echo backend until `shutdown` resolves, printing the banner on
/// startup and the packet total on the way out
pub async fn run_udp_echo_until<F>(
    config: UdpEchoConfig,
    log: Arc<dyn ConsoleLog>,
    shutdown: F,
) -> Result<(), BackendError>
where
    F: Future<Output = ()>,
{
    let identity = config.identity()?;
    let addr = config.socket_addr()?;

    let server = UdpEchoServer::bind(addr, identity, log.clone()).await?;
    let bound = server.local_addr()?;

    let lines = banner(
        "Aegis UDP Echo Server",
        &config.name,
        &bound.ip().to_string(),
        bound.port(),
    );
    print_banner(log.as_ref(), &lines, "Server is ready to receive UDP packets.");

    let handled = server.run_until(shutdown).await?;

    log.line("\n\nShutting down server...");
    log.line(&format!("Server stopped. Total packets handled: {}", handled));
    tracing::info!(packets = handled, "UDP echo backend stopped");

    Ok(())
}
