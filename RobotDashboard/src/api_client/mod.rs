// RobotDashboard/src/api_client/mod.rs

//! 外部 HTTP 服务客户端。
//!
//! 目前只有控制代理：仪表盘通过它把云台指令转发给摄像头。

pub mod service;

pub use service::{pending_status, ControlProxyClient};
