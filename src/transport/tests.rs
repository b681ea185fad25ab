use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::accept_hdr_async;
use tungstenite::handshake::server::{Request, Response as HandshakeResponse};
use tungstenite::protocol::Message as WsMessage;

use super::{Connector, Payload, SocketListener, WebSocketConnector};
use crate::client::{Client, ConnectionState, SendOptions};
use crate::peer::Peer;
use crate::utils::error::{ConnectionError, SendError, TransportError};

async fn local_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Can't bind");
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// Accepts one WebSocket client, records the request target, pushes the
/// given frames and closes once told to.
async fn serve_frames(
    listener: TcpListener,
    frames: Vec<WsMessage>,
    request_target: Arc<Mutex<Option<String>>>,
    close_rx: oneshot::Receiver<()>,
) {
    let (stream, _) = listener.accept().await.unwrap();
    let ws_stream = accept_hdr_async(stream, |req: &Request, resp: HandshakeResponse| {
        *request_target.lock().unwrap() = Some(req.uri().to_string());
        Ok(resp)
    })
    .await
    .expect("WebSocket handshake failed");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    for frame in frames {
        ws_sender.send(frame).await.unwrap();
    }

    let _ = close_rx.await;
    ws_sender.send(WsMessage::Close(None)).await.unwrap();
    // drain until the client acknowledges the close
    while let Some(Ok(_)) = ws_receiver.next().await {}
}

#[tokio::test]
async fn test_client_receives_frames_over_websocket() {
    let (listener, addr) = local_listener().await;
    let request_target = Arc::new(Mutex::new(None));
    let (close_tx, close_rx) = oneshot::channel();
    let server = tokio::spawn(serve_frames(
        listener,
        vec![
            WsMessage::Text("hello".into()),
            WsMessage::Binary(vec![1u8, 2, 3].into()),
        ],
        request_target.clone(),
        close_rx,
    ));

    let peer = Peer::new(addr, "7").insecure();
    let client = Client::connect_as(peer, Some("token=abc")).await.unwrap();
    assert!(client.connected());

    assert_eq!(
        client.next_message().await,
        Ok(Some(Payload::Text("hello".to_string())))
    );
    assert_eq!(
        client.next_message().await,
        Ok(Some(Payload::Binary(vec![1, 2, 3])))
    );

    let pending = client.next_message();
    close_tx.send(()).unwrap();
    assert_eq!(pending.await, Ok(None));
    assert_eq!(client.state(), ConnectionState::Closed);

    assert_eq!(
        request_target.lock().unwrap().as_deref(),
        Some("/7?token=abc")
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_client_close_ends_websocket() {
    let (listener, addr) = local_listener().await;
    let (_close_tx, close_rx) = oneshot::channel();
    let server = tokio::spawn(serve_frames(
        listener,
        Vec::new(),
        Arc::new(Mutex::new(None)),
        close_rx,
    ));

    let client = Client::new(Peer::new(addr, "1").insecure());
    client.connect(None).await.unwrap();

    let pending = client.next_message();
    client.close();

    assert_eq!(pending.await, Ok(None));
    tokio::time::timeout(Duration::from_secs(5), client.closed())
        .await
        .unwrap();
    server.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_to_closed_port_fails() {
    let (listener, addr) = local_listener().await;
    drop(listener);

    let client = Client::new(Peer::new(addr, "1").insecure());
    let err = client.connect(None).await.unwrap_err();

    assert!(matches!(
        err,
        ConnectionError::Handshake(TransportError::WebSocket(_))
    ));
    assert_eq!(client.state(), ConnectionState::Closed);
}

struct IgnoreEvents;

impl SocketListener for IgnoreEvents {
    fn on_open(&self) {}
    fn on_message(&self, _payload: Payload) {}
    fn on_error(&self, _error: TransportError) {}
    fn on_close(&self) {}
}

#[test]
fn test_websocket_connector_needs_runtime() {
    let result = WebSocketConnector.open("ws://127.0.0.1:1/1", Arc::new(IgnoreEvents));
    assert!(matches!(result, Err(TransportError::Refused(_))));
}

/// Minimal HTTP/1.1 responder: reads one request, answers with `status`
/// and hands back the request line and body.
async fn answer_once(listener: TcpListener, status: &'static str) -> (String, Vec<u8>) {
    let (mut stream, _) = listener.accept().await.unwrap();
    let (head, body) = read_request(&mut stream).await;

    let response = format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.unwrap();

    let request_line = head.lines().next().unwrap_or_default().to_string();
    (request_line, body)
}

async fn read_request(stream: &mut TcpStream) -> (String, Vec<u8>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body was complete");
        body.extend_from_slice(&chunk[..n]);
    }
    (head, body)
}

#[tokio::test]
async fn test_send_posts_payload_over_http() {
    let (listener, addr) = local_listener().await;
    let server = tokio::spawn(answer_once(listener, "200 OK"));

    let target = Peer::new(addr, "42").insecure();
    Client::send(&target, "ping", SendOptions::default().query("from=7"))
        .await
        .unwrap();

    let (request_line, body) = server.await.unwrap();
    assert_eq!(request_line, "POST /42?from=7 HTTP/1.1");
    assert_eq!(body, b"ping");
}

#[tokio::test]
async fn test_send_rejected_over_http() {
    let (listener, addr) = local_listener().await;
    let server = tokio::spawn(answer_once(listener, "404 Not Found"));

    let target = Peer::new(addr, "42").insecure();
    let err = Client::send(&target, vec![9u8, 9], SendOptions::default())
        .await
        .unwrap_err();

    match err {
        SendError::Delivery(delivery) => {
            assert_eq!(delivery.status, 404);
            assert_eq!(delivery.reason, "Not Found");
        }
        other => panic!("expected delivery error, got {other:?}"),
    }
    let (_, body) = server.await.unwrap();
    assert_eq!(body, vec![9, 9]);
}

#[tokio::test]
async fn test_send_times_out() {
    let (listener, addr) = local_listener().await;
    // accept but never answer
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });

    let target = Peer::new(addr, "42").insecure();
    let err = Client::send(
        &target,
        "slow",
        SendOptions::default().timeout(Duration::from_millis(100)),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SendError::Transport(TransportError::Timeout)));
    server.abort();
}

#[test]
fn test_payload_accessors() {
    let text = Payload::from("héllo");
    assert_eq!(text.as_text(), Some("héllo"));
    assert_eq!(text.len(), "héllo".len());
    assert_eq!(text.clone().into_bytes(), "héllo".as_bytes());

    let binary = Payload::from(&[0u8, 1][..]);
    assert_eq!(binary.as_text(), None);
    assert_eq!(binary.as_bytes(), &[0, 1]);
    assert!(!binary.is_empty());
    assert!(Payload::from("").is_empty());
}

#[test]
fn test_control_frames_are_not_payloads() {
    assert_eq!(Payload::from_frame(WsMessage::Ping(Vec::<u8>::new().into())), None);
    assert_eq!(
        Payload::from_frame(WsMessage::Text("x".into())),
        Some(Payload::Text("x".to_string()))
    );
}
