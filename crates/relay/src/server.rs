//! WebSocket 接入与广播循环

use std::{future::Future, net::SocketAddr};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;

use crate::registry::ConnectionRegistry;

#[derive(Clone)]
pub struct RelayState {
    pub registry: ConnectionRegistry,
    /// 为 true 时消息不会回送给发送者
    pub exclude_sender: bool,
}

impl RelayState {
    pub fn new(registry: ConnectionRegistry, exclude_sender: bool) -> Self {
        Self {
            registry,
            exclude_sender,
        }
    }
}

/// 任意路径都接受升级
pub fn router(state: RelayState) -> Router {
    Router::new().fallback(upgrade).with_state(state)
}

pub async fn serve<F>(listener: TcpListener, state: RelayState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<RelayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: RelayState) {
    let registry = state.registry.clone();
    let (connection_id, mut outbound) = registry.register(peer).await;
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        // 对端先发 Close 时，回应帧在这里随 flush 发出
        let _ = sink.close().await;
    });

    registry.open(connection_id).await;
    tracing::info!(%connection_id, %peer, "A new client connected");

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    tracing::warn!(%connection_id, %peer, "dropping non UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Err(err) => {
                tracing::warn!(%connection_id, %peer, error = %err, "websocket read failed");
                break;
            }
        };

        tracing::info!(%connection_id, %peer, message = %text, "Received message");
        let report = registry
            .broadcast(connection_id, &text, !state.exclude_sender)
            .await;
        tracing::debug!(
            %connection_id,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast finished"
        );
    }

    registry.close(connection_id).await;
    let _ = writer.await;
    tracing::info!(%connection_id, %peer, "Client disconnected");
}
