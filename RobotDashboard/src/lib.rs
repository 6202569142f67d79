// RobotDashboard/src/lib.rs

//! 机器人操作员仪表盘的后端库。
//!
//! 进程内只有一条到机器人桥接服务 (rosbridge 风格 WebSocket) 的连接，由
//! `ws_client::ConnectionManager` 独占。状态栏、行驶控制等消费者通过
//! `consumers::TelemetryBinding` 接入，接收遥测快照副本和连接状态通知。
//! 云台指令则经 `api_client::ControlProxyClient` 以 HTTP 发往控制代理。

pub mod api_client;
pub mod commands;
pub mod config;
pub mod consumers;
pub mod error;
pub mod event;
pub mod state;
pub mod ws_client;
