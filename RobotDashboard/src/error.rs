// RobotDashboard/src/error.rs

//! 仪表盘的自定义错误类型。
//!
//! 各类错误的处理方式不同：
//! - `TransportError`：由连接管理器按固定间隔重连自行恢复，只以连接状态通知的形式对外可见；
//! - `MalformedMessageError`：单条消息被丢弃，连接保持不变；
//! - `ControlCommandError`：控制代理请求失败，转换为状态栏文本展示给操作员；
//! - `ConfigError`：配置校验失败，仅在启动阶段致命。

use rust_websocket_utils::error::WsError;
use thiserror::Error;

/// 与桥接服务之间的传输层错误。
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("连接桥接服务失败: {0}")]
    ConnectFailed(String),

    #[error("连接桥接服务超时")]
    ConnectTimedOut,

    #[error("连接已关闭: {0}")]
    Closed(String),

    #[error("发送失败: {0}")]
    SendFailed(String),

    #[error("未连接到桥接服务")]
    NotConnected,
}

impl From<WsError> for TransportError {
    fn from(err: WsError) -> Self {
        match err {
            WsError::ConnectionTimeout => TransportError::ConnectTimedOut,
            WsError::NotConnected => TransportError::NotConnected,
            other => TransportError::ConnectFailed(other.to_string()),
        }
    }
}

/// 话题消息无法解析为已知字段。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedMessageError {
    #[error("消息体不是 JSON 对象: {0}")]
    NotAnObject(String),

    #[error("字段类型错误: {0}")]
    InvalidField(String),

    #[error("字段 {field} 超出取值范围: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// 控制代理 (HTTP) 指令失败。
#[derive(Error, Debug)]
pub enum ControlCommandError {
    /// 网络层失败（代理未启动、连接被拒绝、超时等）。
    #[error("控制代理不可达: {0}")]
    Offline(String),

    /// 代理返回了非 2xx 状态码。
    #[error("控制代理返回 HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// 代理返回 `{"status":"error"}`。
    #[error("控制代理拒绝指令: {0}")]
    Rejected(String),
}

impl ControlCommandError {
    /// 转换为状态栏展示文本。
    pub fn status_line(&self) -> String {
        match self {
            ControlCommandError::Offline(_) => "Error: Backend Offline?".to_string(),
            ControlCommandError::HttpStatus { message, .. } | ControlCommandError::Rejected(message) => {
                format!("Error: {}", message)
            }
        }
    }
}

/// 配置校验失败。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("配置项 {field} 无效: {reason}")]
    Invalid { field: &'static str, reason: String },
}
