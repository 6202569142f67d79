// common_models/src/control_payloads.rs

//! 发往控制代理 (HTTP) 的指令负载，以及代理的应答格式。

use crate::enums::PtzDirection;
use serde::{Deserialize, Serialize};

/// 控制代理唯一支持的动作。
pub const MOVE_ACTION: &str = "move";

/// 云台默认速度 (0–100)。
pub const DEFAULT_PTZ_SPEED: u8 = 60;

/// 云台速度上限。
pub const MAX_PTZ_SPEED: u8 = 100;

/// 控制代理请求体：`{"action":"move","direction":"<token>","speed":<int>}`。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PtzCommandPayload {
    /// 动作类型，目前固定为 `"move"`。
    pub action: String,
    /// 方向令牌。
    pub direction: PtzDirection,
    /// 速度，超过上限时会被截断为 100。
    pub speed: u8,
}

impl PtzCommandPayload {
    /// 构造一条移动指令。
    pub fn movement(direction: PtzDirection, speed: u8) -> Self {
        Self {
            action: MOVE_ACTION.to_string(),
            direction,
            speed: speed.min(MAX_PTZ_SPEED),
        }
    }
}

/// 控制代理的应答体。
///
/// 代理不保证返回应答体；若返回，形如 `{"status":"success"|"error","msg":"..."}`。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlProxyReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ControlProxyReply {
    /// 应答是否明确表示失败。
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}
