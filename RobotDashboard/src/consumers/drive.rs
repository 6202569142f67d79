// RobotDashboard/src/consumers/drive.rs

//! 底盘行驶控制。
//!
//! 行驶指令只在遥测链路已连接时被接受，否则直接拒绝。
//! 行驶指令目前没有线上协议，被接受的指令只记录日志。

use crate::consumers::binding::TelemetryBinding;
use crate::ws_client::ConnectionManager;
use common_models::enums::{DriveCommand, RobotMode};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// 一条行驶指令的处理结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Accepted(DriveCommand),
    /// 链路未连接，指令被忽略。
    Rejected(DriveCommand),
}

/// 行驶控制消费者。
pub struct DriveControl {
    connected: Arc<AtomicBool>,
    mode: Mutex<RobotMode>,
    _binding: TelemetryBinding,
}

impl DriveControl {
    pub async fn attach(manager: &Arc<ConnectionManager>) -> Self {
        let connected = Arc::new(AtomicBool::new(false));
        let flag = connected.clone();
        let binding =
            TelemetryBinding::attach_connection(manager, move |is_connected| flag.store(is_connected, Ordering::SeqCst))
                .await;
        Self { connected, mode: Mutex::new(RobotMode::default()), _binding: binding }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// 处理一条行驶指令。
    pub fn accept(&self, command: DriveCommand) -> DriveOutcome {
        if !self.is_connected() {
            warn!("[行驶控制] 遥测链路未连接，忽略指令 {}", command);
            return DriveOutcome::Rejected(command);
        }
        info!("[ROBOT] {}", command);
        DriveOutcome::Accepted(command)
    }

    pub fn mode(&self) -> RobotMode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 在 MANUAL / AUTONOMOUS 之间切换，返回切换后的模式。
    pub fn toggle_mode(&self) -> RobotMode {
        let mut mode = self.mode.lock().unwrap_or_else(PoisonError::into_inner);
        *mode = mode.toggled();
        info!("[行驶控制] 运行模式切换为 {}", *mode);
        *mode
    }
}
