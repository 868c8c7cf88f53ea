//! 活跃连接集合。
//!
//! 每个连接持有一个无界发送队列，由该连接自己的写任务消费。
//! 广播只负责入队，不等待任何对端，因此慢连接不会拖住其他连接。

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// 连接生命周期：`Connecting -> Open -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

struct Peer {
    addr: SocketAddr,
    state: ConnectionState,
    outbound: mpsc::UnboundedSender<String>,
}

/// 一次广播的投递结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    peers: Arc<RwLock<HashMap<ConnectionId, Peer>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个新连接，初始状态为 `Connecting`，尚不接收广播。
    pub async fn register(
        &self,
        addr: SocketAddr,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (outbound, receiver) = mpsc::unbounded_channel();
        self.peers.write().await.insert(
            id,
            Peer {
                addr,
                state: ConnectionState::Connecting,
                outbound,
            },
        );
        (id, receiver)
    }

    /// 把连接加入活跃集合。只有 `Connecting` 状态的连接可以打开。
    pub async fn open(&self, id: ConnectionId) -> bool {
        let mut peers = self.peers.write().await;
        match peers.get_mut(&id) {
            Some(peer) if peer.state == ConnectionState::Connecting => {
                peer.state = ConnectionState::Open;
                true
            }
            _ => false,
        }
    }

    /// 移除连接；丢弃发送端后对应的写任务会自然结束。
    pub async fn close(&self, id: ConnectionId) -> Option<SocketAddr> {
        self.peers.write().await.remove(&id).map(|peer| peer.addr)
    }

    pub async fn state(&self, id: ConnectionId) -> ConnectionState {
        self.peers
            .read()
            .await
            .get(&id)
            .map_or(ConnectionState::Closed, |peer| peer.state)
    }

    pub async fn active_count(&self) -> usize {
        self.peers
            .read()
            .await
            .values()
            .filter(|peer| peer.state == ConnectionState::Open)
            .count()
    }

    /// 把文本投递给所有 `Open` 的连接。
    ///
    /// 某个对端已经断开时只记录日志并继续，不会中断本次广播。
    pub async fn broadcast(
        &self,
        sender: ConnectionId,
        text: &str,
        include_sender: bool,
    ) -> BroadcastReport {
        let peers = self.peers.read().await;
        let mut report = BroadcastReport::default();

        for (id, peer) in peers.iter() {
            if peer.state != ConnectionState::Open || (!include_sender && *id == sender) {
                continue;
            }
            match peer.outbound.send(text.to_owned()) {
                Ok(()) => report.delivered += 1,
                Err(_) => {
                    tracing::warn!(
                        connection_id = %id,
                        peer = %peer.addr,
                        "peer went away during broadcast, skipping"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}
