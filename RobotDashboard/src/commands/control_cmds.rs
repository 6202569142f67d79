// RobotDashboard/src/commands/control_cmds.rs

//! 云台、行驶、模式与快照命令。

use super::CommandContext;
use crate::api_client::pending_status;
use crate::consumers::DriveOutcome;
use common_models::enums::{CameraFeed, DriveCommand, PtzDirection};
use log::info;

/// 云台移动。
///
/// 先记录发出时的提示文本，再等待控制代理应答；失败时返回状态栏错误文本。
/// 控制代理失败不影响遥测连接。
pub async fn ptz_move(context: &CommandContext, direction: PtzDirection, speed: Option<u8>) -> Result<String, String> {
    let speed = speed.unwrap_or(context.config.ptz_speed);
    info!("[云台] {}", pending_status(direction));
    context
        .control_proxy
        .send_ptz(direction, speed)
        .await
        .map(|()| format!("云台指令 {} 已送达 (速度 {})", direction, speed))
        .map_err(|e| e.status_line())
}

/// 底盘行驶。
pub fn drive(context: &CommandContext, command: DriveCommand) -> Result<String, String> {
    match context.drive.accept(command) {
        DriveOutcome::Accepted(cmd) => Ok(format!("行驶指令 {} 已接受", cmd)),
        DriveOutcome::Rejected(cmd) => Err(format!("遥测链路未连接，行驶指令 {} 被忽略", cmd)),
    }
}

pub fn toggle_mode(context: &CommandContext) -> Result<String, String> {
    Ok(format!("MODE: {}", context.drive.toggle_mode()))
}

/// 拍摄快照。
pub fn capture(context: &CommandContext, feed: CameraFeed) -> Result<String, String> {
    info!("[CAPTURE] {} ({})", feed, context.config.stream_url(feed));
    Ok(format!("Snapshot taken: {}", feed))
}
