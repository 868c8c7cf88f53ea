//! 广播中继。
//!
//! 接受任意路径上的 WebSocket 连接，把收到的每条消息原样以文本帧转发给所有在线连接。

pub mod registry;
pub mod server;

pub use registry::{BroadcastReport, ConnectionId, ConnectionRegistry, ConnectionState};
pub use server::{router, serve, RelayState};
