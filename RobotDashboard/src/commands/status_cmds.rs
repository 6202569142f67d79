// RobotDashboard/src/commands/status_cmds.rs

//! 状态查询命令。

use super::CommandContext;

/// 打印连接状态、运行模式与当前状态栏。
pub fn show_status(context: &CommandContext) -> Result<String, String> {
    let snapshot = context.manager.snapshot();
    let line = context.status_bar.render(&snapshot);
    let updated = snapshot
        .updated_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| "--".to_string());
    Ok(format!(
        "{}\n链路状态: {} | 模式: {} | 连接尝试: {} | 最近更新: {} (共 {} 条)",
        line,
        context.manager.state(),
        context.drive.mode(),
        context.manager.connection_attempts(),
        updated,
        snapshot.sample_count
    ))
}
