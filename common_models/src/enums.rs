//! 通用枚举模块。
//!
//! 本模块定义了在仪表盘多个组件之间共享的通用枚举类型，
//! 确保连接状态、云台方向、行驶指令等概念在整个系统中有一致的表示。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 遥测链路的连接状态。
///
/// 整个进程内只有一条到桥接服务的连接，因此任一时刻只存在一个状态值。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// 未连接（初始状态，或连接断开/出错之后）。
    #[default]
    Disconnected,
    /// 正在建立连接（握手进行中）。
    Connecting,
    /// 已连接，话题订阅已经重新下发。
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 解析字符串形式的枚举值失败时返回的错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// 无法识别的原始输入。
    pub input: String,
    /// 期望的枚举类型名。
    pub expected: &'static str,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "无法识别的 {} 取值: '{}'", self.expected, self.input)
    }
}

impl std::error::Error for UnknownVariant {}

/// 控制代理接受的方向令牌。
///
/// 序列化形式为 snake_case，例如 `ZoomIn` <-> `"zoom_in"`。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PtzDirection {
    Forward,
    Reverse,
    Left,
    Right,
    Stop,
    Up,
    Down,
    ZoomIn,
    ZoomOut,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Home,
}

impl PtzDirection {
    /// 全部方向令牌，顺序与控制面板按钮一致。
    pub const ALL: [PtzDirection; 14] = [
        PtzDirection::Forward,
        PtzDirection::Reverse,
        PtzDirection::Left,
        PtzDirection::Right,
        PtzDirection::Stop,
        PtzDirection::Up,
        PtzDirection::Down,
        PtzDirection::ZoomIn,
        PtzDirection::ZoomOut,
        PtzDirection::UpLeft,
        PtzDirection::UpRight,
        PtzDirection::DownLeft,
        PtzDirection::DownRight,
        PtzDirection::Home,
    ];

    /// 返回线上使用的令牌字符串。
    pub fn as_token(&self) -> &'static str {
        match self {
            PtzDirection::Forward => "forward",
            PtzDirection::Reverse => "reverse",
            PtzDirection::Left => "left",
            PtzDirection::Right => "right",
            PtzDirection::Stop => "stop",
            PtzDirection::Up => "up",
            PtzDirection::Down => "down",
            PtzDirection::ZoomIn => "zoom_in",
            PtzDirection::ZoomOut => "zoom_out",
            PtzDirection::UpLeft => "up_left",
            PtzDirection::UpRight => "up_right",
            PtzDirection::DownLeft => "down_left",
            PtzDirection::DownRight => "down_right",
            PtzDirection::Home => "home",
        }
    }
}

impl fmt::Display for PtzDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for PtzDirection {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PtzDirection::ALL
            .iter()
            .copied()
            .find(|d| d.as_token() == normalized)
            .ok_or_else(|| UnknownVariant {
                input: s.to_string(),
                expected: "PtzDirection",
            })
    }
}

/// 底盘行驶指令（仪表盘左侧方向键）。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum DriveCommand {
    Forward,
    Reverse,
    Left,
    Right,
    Stop,
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            DriveCommand::Forward => "FORWARD",
            DriveCommand::Reverse => "REVERSE",
            DriveCommand::Left => "LEFT",
            DriveCommand::Right => "RIGHT",
            DriveCommand::Stop => "STOP",
        };
        f.write_str(token)
    }
}

impl FromStr for DriveCommand {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FORWARD" => Ok(DriveCommand::Forward),
            "REVERSE" => Ok(DriveCommand::Reverse),
            "LEFT" => Ok(DriveCommand::Left),
            "RIGHT" => Ok(DriveCommand::Right),
            "STOP" => Ok(DriveCommand::Stop),
            _ => Err(UnknownVariant {
                input: s.to_string(),
                expected: "DriveCommand",
            }),
        }
    }
}

/// 机器人运行模式。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RobotMode {
    #[default]
    Manual,
    Autonomous,
}

impl RobotMode {
    /// 在手动/自主模式之间切换。
    pub fn toggled(self) -> Self {
        match self {
            RobotMode::Manual => RobotMode::Autonomous,
            RobotMode::Autonomous => RobotMode::Manual,
        }
    }
}

impl fmt::Display for RobotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotMode::Manual => f.write_str("MANUAL"),
            RobotMode::Autonomous => f.write_str("AUTONOMOUS"),
        }
    }
}

/// 仪表盘上的摄像头画面。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CameraFeed {
    Optical,
    Thermal,
}

impl fmt::Display for CameraFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraFeed::Optical => f.write_str("OPTICAL"),
            CameraFeed::Thermal => f.write_str("THERMAL"),
        }
    }
}

impl FromStr for CameraFeed {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optical" => Ok(CameraFeed::Optical),
            "thermal" => Ok(CameraFeed::Thermal),
            _ => Err(UnknownVariant {
                input: s.to_string(),
                expected: "CameraFeed",
            }),
        }
    }
}
