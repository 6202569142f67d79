// RobotDashboard/src/api_client/service.rs

//! 控制代理 (HTTP) 客户端。
//!
//! 云台指令以无状态的 POST 请求发往控制代理，每条指令独立发送，失败不重试，
//! 也不影响遥测连接。失败以状态栏文本的形式返回给调用方。

use crate::error::ControlCommandError;
use anyhow::{Context, Result};
use common_models::control_payloads::{ControlProxyReply, PtzCommandPayload};
use common_models::enums::PtzDirection;
use log::{debug, error, info, warn};
use std::time::Duration;

/// 单次请求的超时。
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// 指令发出后、应答到达前的状态文本。
pub fn pending_status(direction: PtzDirection) -> String {
    match direction {
        PtzDirection::Stop => "Stopping...".to_string(),
        other => format!("Moving {}...", other),
    }
}

/// 控制代理客户端。
#[derive(Debug, Clone)]
pub struct ControlProxyClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl ControlProxyClient {
    /// 创建客户端。
    ///
    /// # 参数
    /// * `endpoint` - 控制代理地址，例如 `http://localhost:8000/api/proxy`。
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("创建 HTTP 客户端失败")?;
        let endpoint = endpoint.into();
        info!("[控制代理客户端] 已创建，目标: {}", endpoint);
        Ok(Self { http_client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 发送一条云台移动指令。
    ///
    /// 成功的条件是 HTTP 2xx 且应答体不是 `{"status":"error",...}`；应答体可以为空。
    pub async fn send_ptz(&self, direction: PtzDirection, speed: u8) -> Result<(), ControlCommandError> {
        let payload = PtzCommandPayload::movement(direction, speed);
        debug!("[控制代理客户端] POST {} {:?}", self.endpoint, payload);

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("[控制代理客户端] 请求失败: {}", e);
                ControlCommandError::Offline(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("[控制代理客户端] 读取应答体失败: {}", e);
            ControlCommandError::Offline(e.to_string())
        })?;
        let reply: ControlProxyReply = serde_json::from_str(&body).unwrap_or_default();

        if !status.is_success() {
            let message = reply
                .msg
                .or_else(|| Some(body.trim().to_string()).filter(|text| !text.is_empty()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("HTTP error").to_string());
            warn!("[控制代理客户端] 代理返回 HTTP {}: {}", status.as_u16(), message);
            return Err(ControlCommandError::HttpStatus { status: status.as_u16(), message });
        }
        if reply.is_error() {
            let message = reply.msg.unwrap_or_else(|| "unknown error".to_string());
            warn!("[控制代理客户端] 代理拒绝了指令 '{}': {}", direction, message);
            return Err(ControlCommandError::Rejected(message));
        }

        info!("[控制代理客户端] 云台指令 '{}' (速度 {}) 已送达", direction, payload.speed);
        Ok(())
    }

    /// 发送云台指令并返回最终的状态栏文本：成功时保持发出时的提示，失败时为错误文本。
    pub async fn ptz_status_line(&self, direction: PtzDirection, speed: u8) -> String {
        match self.send_ptz(direction, speed).await {
            Ok(()) => pending_status(direction),
            Err(e) => e.status_line(),
        }
    }
}
