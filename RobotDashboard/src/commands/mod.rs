// RobotDashboard/src/commands/mod.rs

//! 操作员命令。
//!
//! 仪表盘从标准输入逐行读取操作员命令：
//!
//! ```text
//! ptz <direction> [speed]     云台移动（经控制代理）
//! drive <command>             底盘行驶（仅在遥测链路连接时接受）
//! mode                        切换 MANUAL / AUTONOMOUS
//! snap optical|thermal        拍摄快照
//! status                      打印状态栏
//! quit                        退出
//! ```
//!
//! 每个命令返回 `Result<String, String>`：成功时为要展示的文本，失败时为面向操作员的错误文本。

/// 子模块：云台、行驶、模式与快照命令。
pub mod control_cmds;

/// 子模块：状态查询命令。
pub mod status_cmds;

use crate::api_client::ControlProxyClient;
use crate::config::DashboardConfig;
use crate::consumers::{DriveControl, StatusBar};
use crate::ws_client::ConnectionManager;
use common_models::enums::{CameraFeed, DriveCommand, PtzDirection};
use std::sync::Arc;

/// 用法说明。
pub const USAGE: &str = "用法:
  ptz <direction> [speed]   direction: forward|reverse|left|right|stop|up|down|zoom_in|zoom_out|up_left|up_right|down_left|down_right|home
  drive <command>           command: FORWARD|REVERSE|LEFT|RIGHT|STOP
  mode                      切换 MANUAL / AUTONOMOUS
  snap optical|thermal      拍摄快照
  status                    打印状态栏
  quit                      退出";

/// 一条已解析的操作员命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Ptz { direction: PtzDirection, speed: Option<u8> },
    Drive(DriveCommand),
    ToggleMode,
    Snapshot(CameraFeed),
    Status,
    Quit,
}

impl OperatorCommand {
    /// 解析一行输入。空行返回 `Ok(None)`；无法识别的输入返回带用法说明的错误文本。
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (keyword.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("ptz", [direction]) => OperatorCommand::Ptz { direction: parse_arg(direction)?, speed: None },
            ("ptz", [direction, speed]) => OperatorCommand::Ptz {
                direction: parse_arg(direction)?,
                speed: Some(parse_speed(speed)?),
            },
            ("drive", [command]) => OperatorCommand::Drive(parse_arg(command)?),
            ("mode", []) => OperatorCommand::ToggleMode,
            ("snap", [feed]) => OperatorCommand::Snapshot(parse_arg(feed)?),
            ("status", []) => OperatorCommand::Status,
            ("quit" | "exit", []) => OperatorCommand::Quit,
            _ => return Err(format!("无法识别的命令: '{}'\n{}", line.trim(), USAGE)),
        };
        Ok(Some(command))
    }
}

fn parse_arg<T>(word: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    word.parse::<T>().map_err(|e| format!("{}\n{}", e, USAGE))
}

fn parse_speed(word: &str) -> Result<u8, String> {
    match word.parse::<u8>() {
        Ok(speed) if speed <= 100 => Ok(speed),
        _ => Err(format!("速度必须是 0–100 之间的整数，实际为 '{}'", word)),
    }
}

/// 命令执行所需的上下文，由组合根构造。
pub struct CommandContext {
    pub config: DashboardConfig,
    pub manager: Arc<ConnectionManager>,
    pub status_bar: StatusBar,
    pub drive: DriveControl,
    pub control_proxy: ControlProxyClient,
}

/// 执行一条命令的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFlow {
    Continue(String),
    Quit,
}

/// 执行一条已解析的命令。
pub async fn execute(context: &CommandContext, command: OperatorCommand) -> CommandFlow {
    let result = match command {
        OperatorCommand::Ptz { direction, speed } => control_cmds::ptz_move(context, direction, speed).await,
        OperatorCommand::Drive(cmd) => control_cmds::drive(context, cmd),
        OperatorCommand::ToggleMode => control_cmds::toggle_mode(context),
        OperatorCommand::Snapshot(feed) => control_cmds::capture(context, feed),
        OperatorCommand::Status => status_cmds::show_status(context),
        OperatorCommand::Quit => return CommandFlow::Quit,
    };
    match result {
        Ok(text) | Err(text) => CommandFlow::Continue(text),
    }
}

/// 解析并执行一行输入。
pub async fn handle_line(context: &CommandContext, line: &str) -> CommandFlow {
    match OperatorCommand::parse(line) {
        Ok(Some(command)) => execute(context, command).await,
        Ok(None) => CommandFlow::Continue(String::new()),
        Err(message) => CommandFlow::Continue(message),
    }
}
