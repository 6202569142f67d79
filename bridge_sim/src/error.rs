// bridge_sim/src/error.rs

use rust_websocket_utils::error::WsError;
use thiserror::Error;

/// 模拟桥接服务的错误类型
#[derive(Error, Debug)]
pub enum SimError {
    #[error("WebSocket 服务错误: {0}")]
    WebSocketService(#[from] WsError),

    #[error("序列化推送消息失败: {0}")]
    Encode(String),
}
