//! Integration tests for the TCP transport and framed connections.
//!
//! These tests spin up a real listener on a loopback port picked by the OS
//! and talk to it with raw sockets, so every byte on the wire is checked
//! against the frame format rather than against our own decoder alone.

use std::sync::Arc;
use std::time::Duration;

use quack_protocol::{
    Disconnected, FrameHeader, InputFlags, Message, MessageType, PlayerId,
    Welcome, HEADER_LEN,
};
use quack_transport::{
    Connection, ConnectionEvent, ConnectionId, EventReceiver, Side, TcpTransport,
    TransportError, SEND_QUEUE_CAPACITY,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// =========================================================================
// Helpers
// =========================================================================

/// Accepts one raw client and wraps the server end in a `Connection`.
async fn server_pair() -> (Arc<Connection>, EventReceiver, TcpStream) {
    let transport = TcpTransport::bind("127.0.0.1:0").await.expect("should bind");
    let addr = transport.local_addr().expect("bound address");

    let client = TcpStream::connect(addr).await.expect("client should connect");
    let (stream, _) = transport.accept().await.expect("should accept");

    let (tx, rx) = mpsc::unbounded_channel();
    let conn = Connection::new(ConnectionId::new(1), stream, Side::Server, tx);
    (conn, rx, client)
}

async fn next_event(rx: &mut EventReceiver) -> ConnectionEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event should arrive in time")
        .expect("channel should be open")
}

/// Asserts that no further event arrives within a short window.
async fn assert_quiet(rx: &mut EventReceiver) {
    let extra = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(
        !matches!(extra, Ok(Some(_))),
        "unexpected extra event: {extra:?}"
    );
}

async fn read_frame(stream: &mut TcpStream) -> Message {
    let mut header = [0u8; HEADER_LEN];
    stream.read_exact(&mut header).await.expect("header");
    let header = FrameHeader::parse(&header).expect("valid header");
    let mut payload = vec![0u8; header.length as usize];
    stream.read_exact(&mut payload).await.expect("payload");
    quack_protocol::decode(header.kind, &payload).expect("valid payload")
}

fn disconnected(id: u32) -> Message {
    Message::Disconnected(Disconnected {
        player_id: PlayerId(id),
    })
}

// =========================================================================
// Receiving
// =========================================================================

#[tokio::test]
async fn test_receive_loop_emits_decoded_join() {
    let (conn, mut rx, mut client) = server_pair().await;
    conn.start_receiving(CancellationToken::new());

    client
        .write_all(&[5, 0, 0, 0, 1, 1, 0, 0, 0, b'B'])
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut rx).await,
        ConnectionEvent::Message {
            id: ConnectionId::new(1),
            message: Message::Join { name: "B".into() },
        }
    );
}

#[tokio::test]
async fn test_receive_loop_preserves_frame_order() {
    let (conn, mut rx, mut client) = server_pair().await;
    conn.start_receiving(CancellationToken::new());

    // Two frames in one write, split across a read boundary on purpose.
    let mut bytes = quack_protocol::encode(&Message::Join { name: "A".into() }).unwrap();
    bytes.extend(quack_protocol::encode(&Message::Input(InputFlags::from_byte(6))).unwrap());
    let (first, second) = bytes.split_at(7);
    client.write_all(first).await.unwrap();
    client.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    client.write_all(second).await.unwrap();

    let ConnectionEvent::Message { message, .. } = next_event(&mut rx).await else {
        panic!("expected message");
    };
    assert_eq!(message, Message::Join { name: "A".into() });
    let ConnectionEvent::Message { message, .. } = next_event(&mut rx).await else {
        panic!("expected message");
    };
    assert_eq!(message, Message::Input(InputFlags::from_byte(6)));
}

#[tokio::test]
async fn test_oversized_frame_disconnects_without_message() {
    let (conn, mut rx, mut client) = server_pair().await;
    let task = conn.start_receiving(CancellationToken::new());

    let len = 65537u32.to_le_bytes();
    client
        .write_all(&[len[0], len[1], len[2], len[3], MessageType::Join as u8])
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected {
            id: ConnectionId::new(1)
        }
    );
    task.await.unwrap();
    assert!(conn.is_disconnected());
}

#[tokio::test]
async fn test_unknown_type_disconnects() {
    let (conn, mut rx, mut client) = server_pair().await;
    conn.start_receiving(CancellationToken::new());

    client.write_all(&[0, 0, 0, 0, 42]).await.unwrap();

    assert!(matches!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected { .. }
    ));
}

#[tokio::test]
async fn test_server_message_sent_to_server_side_disconnects() {
    let (conn, mut rx, mut client) = server_pair().await;
    conn.start_receiving(CancellationToken::new());

    let frame = quack_protocol::encode(&disconnected(9)).unwrap();
    client.write_all(&frame).await.unwrap();

    assert!(matches!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected { .. }
    ));
}

#[tokio::test]
async fn test_peer_close_mid_frame_disconnects() {
    let (conn, mut rx, mut client) = server_pair().await;
    conn.start_receiving(CancellationToken::new());

    // Header promises 9 bytes, only 3 arrive before the peer goes away.
    client.write_all(&[9, 0, 0, 0, 1, 5, 0, 0]).await.unwrap();
    drop(client);

    assert!(matches!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected { .. }
    ));
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_peer_close_mid_header_disconnects() {
    let (conn, mut rx, mut client) = server_pair().await;
    conn.start_receiving(CancellationToken::new());

    client.write_all(&[9, 0, 0]).await.unwrap();
    drop(client);

    assert!(matches!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected { .. }
    ));
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_cancellation_stops_receive_loop() {
    let (conn, mut rx, _client) = server_pair().await;
    let cancel = CancellationToken::new();
    let task = conn.start_receiving(cancel.clone());

    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("receive loop should stop")
        .unwrap();
    assert!(matches!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected { .. }
    ));
}

// =========================================================================
// Sending
// =========================================================================

#[tokio::test]
async fn test_send_writes_header_and_json_payload() {
    let (conn, _rx, mut client) = server_pair().await;

    let welcome = Message::Welcome(Welcome {
        player_id: PlayerId(777),
        ducks: vec![],
        food: vec![],
        game_time: 0.0,
    });
    conn.send(&welcome).unwrap();

    assert_eq!(read_frame(&mut client).await, welcome);
}

#[tokio::test]
async fn test_concurrent_sends_do_not_interleave() {
    let (conn, _rx, mut client) = server_pair().await;

    let sends = (1..=32).map(|i| {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move { conn.send(&disconnected(i)) })
    });
    for result in futures_util::future::join_all(sends).await {
        result.unwrap().unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..32 {
        let Message::Disconnected(body) = read_frame(&mut client).await else {
            panic!("expected Disconnected frame");
        };
        seen.push(body.player_id.0);
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=32).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sends_arrive_in_call_order() {
    let (conn, _rx, mut client) = server_pair().await;

    for i in 1..=40 {
        conn.send(&disconnected(i)).unwrap();
        if i % 8 == 0 {
            tokio::task::yield_now().await;
        }
    }

    for expected in 1..=40 {
        assert_eq!(read_frame(&mut client).await, disconnected(expected));
    }
}

#[tokio::test]
async fn test_full_send_queue_drops_slow_peer() {
    let (conn, mut rx, _client) = server_pair().await;

    // Nothing yields in between, so the writer task cannot drain the queue.
    for i in 0..SEND_QUEUE_CAPACITY as u32 {
        conn.send(&disconnected(i)).unwrap();
    }
    let err = conn.send(&disconnected(999)).unwrap_err();

    assert!(matches!(err, TransportError::SendQueueFull(_)));
    assert!(conn.is_disconnected());
    assert_eq!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected {
            id: ConnectionId::new(1)
        }
    );
    assert!(matches!(
        conn.send(&disconnected(1000)),
        Err(TransportError::ConnectionClosed(_))
    ));
}

#[tokio::test]
async fn test_send_after_disconnect_fails_without_writing() {
    let (conn, _rx, _client) = server_pair().await;
    conn.disconnect();

    let err = conn.send(&disconnected(1)).unwrap_err();
    assert!(matches!(err, TransportError::ConnectionClosed(_)));
}

// =========================================================================
// Disconnect
// =========================================================================

#[tokio::test]
async fn test_disconnect_fires_exactly_once_under_concurrency() {
    let (conn, mut rx, _client) = server_pair().await;
    conn.start_receiving(CancellationToken::new());

    let callers = (0..16).map(|_| {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move { conn.disconnect() })
    });
    futures_util::future::join_all(callers).await;

    assert_eq!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected {
            id: ConnectionId::new(1)
        }
    );
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_disconnect_closes_socket() {
    let (conn, _rx, mut client) = server_pair().await;
    conn.start_receiving(CancellationToken::new());

    conn.disconnect();

    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
        .await
        .expect("peer should observe close");
    assert!(matches!(read, Ok(0) | Err(_)));
}

// =========================================================================
// Client side
// =========================================================================

#[tokio::test]
async fn test_client_connection_round_trip() {
    let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (client, accepted) = tokio::join!(Connection::connect(addr, tx), transport.accept());
    let client = client.expect("client should connect");
    let (mut server, _) = accepted.expect("should accept");
    assert_eq!(client.side(), Side::Client);
    client.start_receiving(CancellationToken::new());

    client.send(&Message::Join { name: "B".into() }).unwrap();
    assert_eq!(read_frame(&mut server).await, Message::Join { name: "B".into() });

    server
        .write_all(&quack_protocol::encode(&disconnected(4)).unwrap())
        .await
        .unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        ConnectionEvent::Message {
            id: ConnectionId::CLIENT,
            message: disconnected(4),
        }
    );
}

#[tokio::test]
async fn test_client_rejects_client_messages_from_server() {
    let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (client, accepted) = tokio::join!(Connection::connect(addr, tx), transport.accept());
    let client = client.unwrap();
    let (mut server, _) = accepted.unwrap();
    client.start_receiving(CancellationToken::new());

    server
        .write_all(&quack_protocol::encode(&Message::Join { name: "X".into() }).unwrap())
        .await
        .unwrap();

    assert!(matches!(
        next_event(&mut rx).await,
        ConnectionEvent::Disconnected { .. }
    ));
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap();
    drop(transport);

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = Connection::connect(addr, tx).await.unwrap_err();
    assert!(matches!(err, TransportError::ConnectFailed(_)));
}
