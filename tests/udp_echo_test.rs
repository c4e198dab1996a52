use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use aegis_test_backends::config::{ServerIdentity, UdpEchoConfig};
use aegis_test_backends::logging::CapturedLog;
use aegis_test_backends::udp_echo::{
    run_udp_echo_until, EchoResponse, UdpEchoServer, MAX_DATAGRAM_SIZE,
};
use aegis_test_backends::BackendError;

struct TestEcho {
    addr: SocketAddr,
    log: Arc<CapturedLog>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<u64, BackendError>>,
}

async fn start_echo(name: &str) -> TestEcho {
    let log = Arc::new(CapturedLog::new());
    let server = UdpEchoServer::bind(
        "127.0.0.1:0".parse().unwrap(),
        ServerIdentity::new(name).unwrap(),
        log.clone(),
    )
    .await
    .expect("Failed to bind echo server");
    let addr = server.local_addr().unwrap();

    let (shutdown, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async {
        let _ = rx.await;
    }));

    TestEcho {
        addr,
        log,
        shutdown,
        handle,
    }
}

async fn client_for(addr: SocketAddr) -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.connect(addr).await.unwrap();
    socket
}

async fn exchange(socket: &UdpSocket, payload: &[u8]) -> EchoResponse {
    socket.send(payload).await.expect("Failed to send datagram");

    let mut buf = vec![0u8; 65_535];
    let len = timeout(Duration::from_secs(2), socket.recv(&mut buf))
        .await
        .expect("Timed out waiting for reply")
        .expect("Failed to receive reply");

    serde_json::from_slice(&buf[..len]).expect("Reply is not valid JSON")
}

#[tokio::test]
async fn test_text_payload_is_echoed() {
    let echo = start_echo("udp-text").await;
    let socket = client_for(echo.addr).await;

    let reply = exchange(&socket, b"hello").await;
    assert_eq!(reply.server, "udp-text");
    assert_eq!(reply.echo, "hello");
    assert_eq!(reply.received_bytes, 5);
    assert_eq!(reply.packet_number, 1);
    assert!(reply.timestamp.ends_with('Z'));

    let _ = echo.shutdown.send(());
    let handled = echo.handle.await.unwrap().unwrap();
    assert_eq!(handled, 1);
}

#[tokio::test]
async fn test_packet_numbers_are_sequential_across_payload_kinds() {
    let echo = start_echo("udp-seq").await;
    let socket = client_for(echo.addr).await;

    let payloads: Vec<Vec<u8>> = vec![
        b"first".to_vec(),
        vec![0xff, 0xfe, 0x00, 0x01],
        "héllo wörld".as_bytes().to_vec(),
        vec![0x80; 64],
        Vec::new(),
        b"last".to_vec(),
    ];

    for (i, payload) in payloads.iter().enumerate() {
        let reply = exchange(&socket, payload).await;
        assert_eq!(reply.packet_number, i as u64 + 1);
        assert_eq!(reply.received_bytes, payload.len());
    }

    let _ = echo.shutdown.send(());
    let handled = echo.handle.await.unwrap().unwrap();
    assert_eq!(handled, payloads.len() as u64);
}

#[tokio::test]
async fn test_binary_payload_does_not_crash() {
    let echo = start_echo("udp-binary").await;
    let socket = client_for(echo.addr).await;

    let payload = [0xc3, 0x28, 0xa0, 0xa1, b'o', b'k'];
    let reply = exchange(&socket, &payload).await;
    assert_eq!(reply.received_bytes, payload.len());
    assert!(reply.echo.ends_with("ok"));
    assert!(reply.echo.contains('\u{fffd}'));

    // the server is still answering afterwards
    let reply = exchange(&socket, b"again").await;
    assert_eq!(reply.packet_number, 2);
    assert_eq!(reply.echo, "again");

    let lines = echo.log.lines();
    assert!(lines.iter().any(|l| l == "  Binary data: c328a0a16f6b..."));
    assert!(lines.iter().any(|l| l == "  Message: again"));

    let _ = echo.shutdown.send(());
    echo.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_oversized_datagram_is_truncated() {
    let echo = start_echo("udp-big").await;
    let socket = client_for(echo.addr).await;

    let payload = vec![b'a'; MAX_DATAGRAM_SIZE + 500];
    let reply = exchange(&socket, &payload).await;
    assert_eq!(reply.received_bytes, MAX_DATAGRAM_SIZE);
    assert_eq!(reply.echo.len(), MAX_DATAGRAM_SIZE);

    let _ = echo.shutdown.send(());
    echo.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_counter_is_shared_across_senders() {
    let echo = start_echo("udp-multi").await;
    let first = client_for(echo.addr).await;
    let second = client_for(echo.addr).await;

    assert_eq!(exchange(&first, b"a").await.packet_number, 1);
    assert_eq!(exchange(&second, b"b").await.packet_number, 2);
    assert_eq!(exchange(&first, b"c").await.packet_number, 3);

    let _ = echo.shutdown.send(());
    assert_eq!(echo.handle.await.unwrap().unwrap(), 3);
}

/// Wait for the startup banner and read the bound address from it
async fn wait_for_bound_address(log: &CapturedLog) -> SocketAddr {
    for _ in 0..100 {
        let address = log.lines().iter().find_map(|line| {
            line.strip_prefix("║ Address:")
                .map(|rest| rest.trim_end_matches('║').trim().to_string())
        });
        if let Some(address) = address {
            return address.parse().expect("Banner address is not a socket address");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Echo server never printed its banner");
}

#[tokio::test]
async fn test_shutdown_prints_packet_total() {
    let log = Arc::new(CapturedLog::new());
    let config = UdpEchoConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        name: "udp-summary".to_string(),
        ..UdpEchoConfig::default()
    };

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(run_udp_echo_until(config, log.clone(), async {
        let _ = rx.await;
    }));

    let addr = wait_for_bound_address(&log).await;
    let socket = client_for(addr).await;
    assert_eq!(exchange(&socket, b"one").await.packet_number, 1);
    assert_eq!(exchange(&socket, &[0xff, 0x00]).await.packet_number, 2);

    let _ = tx.send(());
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("Echo server did not stop")
        .unwrap()
        .expect("Echo server returned an error");

    let lines = log.lines();
    assert_eq!(
        lines[lines.len() - 2..].to_vec(),
        vec![
            "\n\nShutting down server...",
            "Server stopped. Total packets handled: 2",
        ]
    );

    // the socket is closed once the server has stopped
    socket.send(b"late").await.ok();
    let mut buf = [0u8; 1024];
    assert!(timeout(Duration::from_millis(200), socket.recv(&mut buf)).await.map_or(true, |r| r.is_err()));
}

#[tokio::test]
async fn test_every_counted_packet_is_answered_on_shutdown() {
    let echo = start_echo("udp-drain").await;
    let socket = client_for(echo.addr).await;

    for i in 0..20u8 {
        socket.send(&[b'p', i]).await.expect("Failed to send datagram");
    }
    let _ = echo.shutdown.send(());
    let handled = echo.handle.await.unwrap().unwrap();

    let mut replies = 0u64;
    let mut buf = vec![0u8; 65_535];
    while let Ok(Ok(len)) = timeout(Duration::from_millis(200), socket.recv(&mut buf)).await {
        let reply: EchoResponse = serde_json::from_slice(&buf[..len]).unwrap();
        replies += 1;
        assert_eq!(reply.packet_number, replies);
    }

    assert_eq!(replies, handled);
    let echoed = echo.log.lines().iter().filter(|l| l.starts_with("  Echoed ")).count();
    assert_eq!(echoed as u64, handled);
}
