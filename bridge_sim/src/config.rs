// bridge_sim/src/config.rs

//! 模拟桥接服务的配置。
//!
//! 配置文件默认为 `config/bridge_sim_config.json`，可通过环境变量 `BRIDGE_SIM_CONFIG` 指定。
//! 文件不存在时使用默认配置。

use anyhow::{Context, Result};
use common_models::ws_payloads::BMS_STATUS_TOPIC;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 模拟服务的默认主机地址
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// 模拟服务的默认端口号（与 rosbridge 默认端口一致）
pub const DEFAULT_PORT: u16 = 9090;

pub const CONFIG_ENV_VAR: &str = "BRIDGE_SIM_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/bridge_sim_config.json";

/// 模拟服务配置
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SimConfig {
    /// 绑定的主机地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 推送间隔（毫秒）
    pub publish_interval_ms: u64,
    /// 推送的话题
    pub topic: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            publish_interval_ms: 1000,
            topic: BMS_STATUS_TOPIC.to_string(),
        }
    }
}

impl SimConfig {
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// 从指定文件加载配置；文件不存在时返回默认配置。
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("[配置模块] 未在 {:?} 找到配置文件，将使用默认配置。", path);
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("无法读取配置文件 {:?}", path))?;
        let config: SimConfig =
            serde_json::from_str(&content).with_context(|| format!("解析配置文件 {:?} 失败", path))?;
        if config.publish_interval_ms == 0 {
            anyhow::bail!("配置文件 {:?} 中的 publish_interval_ms 必须大于 0", path);
        }
        info!("[配置模块] 已成功从配置文件 {:?} 加载配置。", path);
        Ok(config)
    }

    /// 监听地址。
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("无效的监听地址 {}:{}", self.host, self.port))
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SimConfig::default();
        assert_eq!(config.port, 9090);
        assert_eq!(config.publish_interval(), Duration::from_secs(1));
        assert_eq!(config.topic, BMS_STATUS_TOPIC);
        assert_eq!(config.socket_addr().expect("默认地址应合法").port(), 9090);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("bridge_sim_config_does_not_exist.json");
        assert_eq!(SimConfig::load_from(&path).expect("缺失的配置文件不应导致错误"), SimConfig::default());
    }

    #[test]
    fn partial_file_and_invalid_values() {
        let path = std::env::temp_dir().join(format!("bridge_sim_config_{}.json", std::process::id()));
        fs::write(&path, r#"{ "port": 9191 }"#).expect("写入临时配置失败");
        let config = SimConfig::load_from(&path).expect("加载配置失败");
        assert_eq!(config.port, 9191);
        assert_eq!(config.host, DEFAULT_HOST);

        fs::write(&path, r#"{ "publish_interval_ms": 0 }"#).expect("写入临时配置失败");
        assert!(SimConfig::load_from(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
