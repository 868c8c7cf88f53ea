use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use relay::{serve, ConnectionRegistry, RelayState};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_relay(exclude_sender: bool) -> (SocketAddr, ConnectionRegistry) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let registry = ConnectionRegistry::new();
    let state = RelayState::new(registry.clone(), exclude_sender);
    tokio::spawn(serve(listener, state, std::future::pending()));
    (addr, registry)
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("websocket handshake");
    client
}

async fn wait_for_active(registry: &ConnectionRegistry, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.active_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("active set did not settle");
}

async fn next_text(client: &mut Client) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read frame");
        match frame {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn assert_silent(client: &mut Client) {
    let outcome = tokio::time::timeout(Duration::from_millis(300), client.next()).await;
    assert!(outcome.is_err(), "expected no frame, got {outcome:?}");
}

#[tokio::test]
async fn message_reaches_every_client_including_the_sender() {
    let (addr, registry) = spawn_relay(false).await;
    let mut a = connect(addr, "/").await;
    let mut b = connect(addr, "/").await;
    wait_for_active(&registry, 2).await;

    a.send(Message::text("hello")).await.unwrap();

    assert_eq!(next_text(&mut b).await, "hello");
    assert_eq!(next_text(&mut a).await, "hello");
}

#[tokio::test]
async fn exclude_sender_keeps_the_author_silent() {
    let (addr, registry) = spawn_relay(true).await;
    let mut a = connect(addr, "/").await;
    let mut b = connect(addr, "/").await;
    wait_for_active(&registry, 2).await;

    a.send(Message::text("hello")).await.unwrap();

    assert_eq!(next_text(&mut b).await, "hello");
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn departing_client_does_not_break_delivery() {
    let (addr, registry) = spawn_relay(false).await;
    let mut a = connect(addr, "/").await;
    let mut b = connect(addr, "/").await;
    let mut c = connect(addr, "/").await;
    wait_for_active(&registry, 3).await;

    c.close(None).await.unwrap();
    drop(c);
    a.send(Message::text("still here")).await.unwrap();

    assert_eq!(next_text(&mut b).await, "still here");
    assert_eq!(next_text(&mut a).await, "still here");
    wait_for_active(&registry, 2).await;
}

#[tokio::test]
async fn utf8_binary_frames_are_relayed_as_text() {
    let (addr, registry) = spawn_relay(true).await;
    let mut a = connect(addr, "/").await;
    let mut b = connect(addr, "/").await;
    wait_for_active(&registry, 2).await;

    a.send(Message::binary(b"\xff\xfe".to_vec())).await.unwrap();
    a.send(Message::binary(b"bin".to_vec())).await.unwrap();

    // 非 UTF-8 的帧被丢弃，下一条才到达
    assert_eq!(next_text(&mut b).await, "bin");
}

#[tokio::test]
async fn any_path_is_accepted() {
    let (addr, registry) = spawn_relay(false).await;
    let mut a = connect(addr, "/chat/lobby").await;
    let mut b = connect(addr, "/anything").await;
    wait_for_active(&registry, 2).await;

    b.send(Message::text("over here")).await.unwrap();

    assert_eq!(next_text(&mut a).await, "over here");
}

#[tokio::test]
async fn client_close_is_answered_with_a_close_frame() {
    let (addr, registry) = spawn_relay(false).await;
    let mut a = connect(addr, "/").await;
    wait_for_active(&registry, 1).await;

    a.send(Message::Close(None)).await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(5), a.next())
        .await
        .expect("timed out waiting for close reply");
    assert!(
        matches!(reply, Some(Ok(Message::Close(_)))),
        "expected a close frame, got {reply:?}"
    );
    wait_for_active(&registry, 0).await;
}
