//! `rust_websocket_utils` 是一个提供 WebSocket 通信实用功能的 Rust Crate。
//! 它封装了与机器人桥接服务 (rosbridge 风格 JSON 协议) 通信所需的传输层细节，
//! 特别关注与 `common_models` 一起使用时的话题消息编解码。
//!
//! 主要模块包括：
//! - `message`: 定义桥接协议的操作 (`BridgeOp`) 与入站消息信封 (`BridgeMessage`)。
//! - `error`: 定义库中使用的统一错误类型 `WsError`。
//! - `frame`: 客户端与服务端共用的帧收发辅助函数。
//! - `server`: 提供 WebSocket 服务器端传输层（模拟桥接服务与测试使用）。
//! - `client`: 提供 WebSocket 客户端传输层（仪表盘连接桥接服务使用）。

pub mod client;
pub mod error;
pub mod frame;
pub mod message;
pub mod server;
