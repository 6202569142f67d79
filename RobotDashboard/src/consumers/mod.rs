// RobotDashboard/src/consumers/mod.rs

//! 遥测消费者。
//!
//! 每个消费者通过 `TelemetryBinding` 接入连接管理器，只能表达连接意愿、
//! 接收快照副本和连接状态，不能直接操作连接。

pub mod binding;
pub mod drive;
pub mod status_bar;

pub use binding::TelemetryBinding;
pub use drive::{DriveControl, DriveOutcome};
pub use status_bar::{Severity, StatusBar, StatusLine};
