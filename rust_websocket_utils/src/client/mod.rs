// rust_websocket_utils/src/client/mod.rs

//! WebSocket 客户端模块。
//!
//! 主要职责包括：
//! - **连接建立**: 校验 URL 并连接到远程桥接服务，可选连接超时。
//! - **消息传输**: 发送桥接操作，接收并解析入站的话题消息。
//! - **传输层抽象**: 封装 `tokio-tungstenite` 的细节，把连接拆分为可独立持有的发送端与接收端，
//!   以便上层由一个任务读、由连接管理器持有写。

pub mod transport;
