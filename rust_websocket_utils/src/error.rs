// rust_websocket_utils/src/error.rs

//! 定义 WebSocket 工具库相关的错误类型。

use thiserror::Error;

/// WebSocket 工具库的统一错误类型。
#[derive(Error, Debug)]
pub enum WsError {
    /// 当 serde 序列化失败时返回。
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 当 serde 反序列化失败时返回。
    /// 对于长连接来说这是"单帧错误"，调用方应丢弃该帧并继续接收。
    #[error("反序列化错误: {0}")]
    DeserializationError(String),

    /// WebSocket 协议相关的错误，例如握手失败、连接被重置等。
    /// 这类错误意味着连接已不可用。
    #[error("WebSocket协议错误: {0}")]
    WebSocketProtocolError(#[from] tokio_tungstenite::tungstenite::Error),

    /// 底层 I/O 错误。
    #[error("I/O错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 连接超时错误。
    #[error("连接超时")]
    ConnectionTimeout,

    /// 无效的 URL 格式或不受支持的协议。
    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    /// 未连接错误，当尝试在未建立连接时进行操作。
    #[error("未连接")]
    NotConnected,

    /// 通用消息错误，用于其他未明确分类的错误（例如收到二进制帧）。
    #[error("消息错误: {0}")]
    Message(String),
}

impl WsError {
    /// 该错误是否意味着连接已经不可用（需要重连）。
    ///
    /// 反序列化错误和非预期的帧类型只影响单条消息。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WsError::DeserializationError(_) | WsError::Message(_))
    }
}
