// RobotDashboard/src/config.rs

//! 仪表盘的配置管理模块。
//!
//! 配置来自一个静态 JSON 文件，默认路径为 `config/dashboard_config.json`，
//! 可通过环境变量 `ROBOT_DASHBOARD_CONFIG` 指定其他路径。
//! 文件不存在时使用默认配置并记录警告；文件无法读取或内容无效时返回带上下文的错误。
//! 文件中缺省的字段取默认值。

use crate::error::ConfigError;
use anyhow::{Context, Result};
use common_models::control_payloads::{DEFAULT_PTZ_SPEED, MAX_PTZ_SPEED};
use common_models::enums::CameraFeed;
use common_models::ws_payloads::BMS_STATUS_TOPIC;
use rust_websocket_utils::client::transport::validate_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 覆盖配置文件路径的环境变量。
pub const CONFIG_ENV_VAR: &str = "ROBOT_DASHBOARD_CONFIG";

/// 默认配置文件路径（相对于工作目录）。
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard_config.json";

/// 桥接服务连接配置。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeConfig {
    /// 桥接服务 URL，例如 `"ws://192.168.1.102:9090"`。
    pub url: String,
    /// 需要订阅的话题。
    pub topics: Vec<String>,
    /// 断线后的固定重连间隔（毫秒）。
    pub reconnect_delay_ms: u64,
    /// 单次连接尝试的超时（毫秒）。
    pub connect_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: "ws://192.168.1.102:9090".to_string(),
            topics: vec![BMS_STATUS_TOPIC.to_string()],
            reconnect_delay_ms: 3000,
            connect_timeout_ms: 5000,
        }
    }
}

/// 仪表盘配置。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    pub bridge: BridgeConfig,
    /// 控制代理 (HTTP) 的地址。
    pub control_proxy_url: String,
    /// 可见光视频流地址。
    pub optical_stream_url: String,
    /// 热成像视频流地址。
    pub thermal_stream_url: String,
    /// 云台指令的默认速度 (0–100)。
    pub ptz_speed: u8,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            control_proxy_url: "http://localhost:8000/api/proxy".to_string(),
            optical_stream_url: "http://localhost:8000/api/video".to_string(),
            thermal_stream_url: "http://localhost:8000/api/thermal".to_string(),
            ptz_speed: DEFAULT_PTZ_SPEED,
        }
    }
}

impl DashboardConfig {
    /// 配置文件路径：环境变量优先，否则使用默认路径。
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// 从默认位置加载配置。
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// 从指定文件加载配置。
    ///
    /// # 返回值
    /// - 文件不存在：记录警告并返回默认配置；
    /// - 文件无法读取、不是合法 JSON 或校验失败：返回包含详细上下文的错误。
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!(
                "[仪表盘配置] 配置文件 '{}' 未找到，使用默认配置 (桥接服务: {})",
                path.display(),
                BridgeConfig::default().url
            );
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件 '{}'，请检查文件权限和路径是否正确", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&config_str).with_context(|| {
            format!(
                "解析配置文件 '{}' 失败，请确保内容是有效的 JSON 且符合 {} 结构",
                path.display(),
                std::any::type_name::<DashboardConfig>()
            )
        })?;
        config
            .validate()
            .with_context(|| format!("配置文件 '{}' 校验失败", path.display()))?;

        log::info!(
            "[仪表盘配置] 已从 '{}' 加载配置。桥接服务: {}，话题: {:?}",
            path.display(),
            config.bridge.url,
            config.bridge.topics
        );
        Ok(config)
    }

    /// 校验配置项。
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.bridge.url).map_err(|e| ConfigError::Invalid {
            field: "bridge.url",
            reason: e.to_string(),
        })?;
        if self.bridge.topics.iter().any(|topic| topic.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "bridge.topics",
                reason: "话题名不能为空".to_string(),
            });
        }
        if self.bridge.reconnect_delay_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "bridge.reconnect_delay_ms",
                reason: "重连间隔必须大于 0".to_string(),
            });
        }
        if self.bridge.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "bridge.connect_timeout_ms",
                reason: "连接超时必须大于 0".to_string(),
            });
        }
        for (field, value) in [
            ("control_proxy_url", &self.control_proxy_url),
            ("optical_stream_url", &self.optical_stream_url),
            ("thermal_stream_url", &self.thermal_stream_url),
        ] {
            validate_http_url(field, value)?;
        }
        if self.ptz_speed > MAX_PTZ_SPEED {
            return Err(ConfigError::Invalid {
                field: "ptz_speed",
                reason: format!("速度必须在 0–{} 之间，实际为 {}", MAX_PTZ_SPEED, self.ptz_speed),
            });
        }
        Ok(())
    }

    /// 指定画面的视频流地址。
    pub fn stream_url(&self, feed: CameraFeed) -> &str {
        match feed {
            CameraFeed::Optical => &self.optical_stream_url,
            CameraFeed::Thermal => &self.thermal_stream_url,
        }
    }
}

fn validate_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("'{}' 不是合法的 URL: {}", value, e),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            field,
            reason: format!("不支持的协议 '{}'", other),
        }),
    }
}
