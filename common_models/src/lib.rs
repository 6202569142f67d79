//! `common_models` 公共模型库 crate。
//!
//! 本 crate 集中定义了机器人仪表盘各个 Rust 组件（`rust_websocket_utils` 传输层、
//! `robot-dashboard` 仪表盘核心、`bridge_sim` 模拟桥接服务）之间共享的数据结构和枚举类型。
//!
//! 主要包含以下类型的模型：
//! - **遥测负载 (`ws_payloads`)**: 机器人桥接服务通过 WebSocket 推送的话题消息体，
//!   例如电池管理系统 (BMS) 状态。
//! - **控制负载 (`control_payloads`)**: 发往控制代理 (HTTP) 的云台/行驶指令结构体。
//! - **通用枚举 (`enums`)**: 连接状态、云台方向、行驶指令等，保证类型安全和一致性。
//!
//! 所有模型均派生 `Serialize`/`Deserialize`/`Debug`/`Clone`，以便在 JSON 与 Rust 之间转换。

pub mod control_payloads; // 控制代理 HTTP 请求/响应负载
pub mod enums; // 项目中通用的枚举类型定义
pub mod ws_payloads; // 桥接服务话题消息负载
