// RobotDashboard/src/ws_client/topics.rs

//! 已知话题的消息解析器。
//!
//! 入站消息在这里一次性校验为强类型的 `TelemetrySample`，或者得到 `MalformedMessageError`。

use crate::error::MalformedMessageError;
use crate::state::TelemetrySample;
use crate::ws_client::subscriptions::TopicHandler;
use common_models::ws_payloads::{BmsStatusPayload, BMS_STATUS_TOPIC};
use serde_json::Value;
use std::sync::Arc;

/// 解析 BMS 状态消息。
///
/// 接受 `{"msg":{...}}` 或直接的字段对象；消息体必须是 JSON 对象，数值字段必须是数字，
/// SOC/SOH 必须落在 0–100 之间。
pub fn parse_bms_status(payload: &Value) -> Result<TelemetrySample, MalformedMessageError> {
    let body = match payload.get("msg") {
        Some(inner) if !inner.is_null() => inner,
        _ => payload,
    };
    if !body.is_object() {
        return Err(MalformedMessageError::NotAnObject(truncate(body.to_string())));
    }

    let parsed: BmsStatusPayload =
        serde_json::from_value(body.clone()).map_err(|e| MalformedMessageError::InvalidField(e.to_string()))?;
    if let Some((field, value)) = parsed.out_of_range_field() {
        return Err(MalformedMessageError::OutOfRange { field, value });
    }

    Ok(TelemetrySample {
        state_of_charge: parsed.soc,
        state_of_health: parsed.soh,
        battery_current_amps: parsed.battery_current,
        battery_voltage_volts: parsed.battery_voltage,
        battery_temperature_celsius: parsed.battery_temperature,
    })
}

/// BMS 状态话题的处理器。
pub fn bms_status_handler() -> TopicHandler {
    Arc::new(parse_bms_status)
}

/// 按话题名查找内置处理器；未知话题返回 `None`。
pub fn handler_for(topic: &str) -> Option<TopicHandler> {
    match topic {
        BMS_STATUS_TOPIC => Some(bms_status_handler()),
        _ => None,
    }
}

fn truncate(mut text: String) -> String {
    const LIMIT: usize = 80;
    if text.len() > LIMIT {
        let cut = (0..=LIMIT).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        text.truncate(cut);
        text.push('…');
    }
    text
}
