// rust_websocket_utils/src/server/mod.rs

//! WebSocket 服务端模块。
//!
//! 主要职责包括：
//! - **服务器启动与监听**: 在指定地址（或已绑定的监听器）上接受传入连接。
//! - **连接管理**: 为每个连接完成 WebSocket 握手，并在独立任务中交给上层回调处理。
//! - **操作解析**: 把客户端发来的文本帧还原为 `BridgeOp`。

pub mod transport;
