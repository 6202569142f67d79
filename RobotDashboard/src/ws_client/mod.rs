// RobotDashboard/src/ws_client/mod.rs

//! 仪表盘的 WebSocket 客户端模块。
//!
//! 本模块 (`ws_client`) 封装了与机器人桥接服务通信的全部核心逻辑。
//!
//! ## 核心组件：
//! - `service.rs`：`ConnectionManager`，持有唯一的连接及其生命周期状态机和重连定时器。
//! - `subscriptions.rs`：`SubscriptionRegistry`，记录话题与处理器，连接建立后重新订阅。
//! - `topics.rs`：已知话题（BMS 状态）的消息解析器。

pub mod service;
pub mod subscriptions;
pub mod topics;

pub use service::{ConnectionManager, ConnectionOptions};
pub use subscriptions::{SubscriptionRegistry, TopicHandler};
