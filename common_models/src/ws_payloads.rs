// common_models/src/ws_payloads.rs

//! 包含机器人桥接服务通过 WebSocket 推送的各类话题消息体定义。

use serde::{Deserialize, Serialize};

/// 电池管理系统 (BMS) 状态话题的规范名称。
pub const BMS_STATUS_TOPIC: &str = "/dash_board/BMS_status";

/// BMS 状态话题的消息体。
///
/// 每个字段在任意一条消息中都可以缺省；缺省（或 JSON `null`）的字段表示
/// "本条消息未携带该值"，而不是"该值变为 0"。数值字段若不是 JSON 数字，反序列化将失败。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BmsStatusPayload {
    /// 电池剩余电量百分比 (0–100)。
    #[serde(rename = "SOC", default, skip_serializing_if = "Option::is_none")]
    pub soc: Option<f64>,
    /// 电池健康度百分比 (0–100)。
    #[serde(rename = "SOH", default, skip_serializing_if = "Option::is_none")]
    pub soh: Option<f64>,
    /// 电池电流，单位安培。
    #[serde(rename = "batteryCurrent", default, skip_serializing_if = "Option::is_none")]
    pub battery_current: Option<f64>,
    /// 电池电压，单位伏特。
    #[serde(rename = "batteryVoltage", default, skip_serializing_if = "Option::is_none")]
    pub battery_voltage: Option<f64>,
    /// 电池温度，单位摄氏度。
    #[serde(rename = "batteryTemperature", default, skip_serializing_if = "Option::is_none")]
    pub battery_temperature: Option<f64>,
}

impl BmsStatusPayload {
    /// 本条消息是否没有携带任何已知字段。
    pub fn is_empty(&self) -> bool {
        self.soc.is_none()
            && self.soh.is_none()
            && self.battery_current.is_none()
            && self.battery_voltage.is_none()
            && self.battery_temperature.is_none()
    }

    /// 检查百分比字段是否落在 0–100 区间内。
    ///
    /// 返回第一个越界的字段名（线上名称）及其取值；全部合法时返回 `None`。
    pub fn out_of_range_field(&self) -> Option<(&'static str, f64)> {
        let percent_fields = [("SOC", self.soc), ("SOH", self.soh)];
        percent_fields
            .into_iter()
            .find_map(|(name, value)| match value {
                Some(v) if !(0.0..=100.0).contains(&v) => Some((name, v)),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    /// 测试只携带部分字段的消息能被解析，缺省字段为 None。
    fn partial_bms_message_leaves_missing_fields_empty() {
        let payload: BmsStatusPayload =
            serde_json::from_value(json!({ "SOC": 42, "batteryVoltage": 24.1 })).expect("解析部分字段失败");
        assert_eq!(payload.soc, Some(42.0));
        assert_eq!(payload.battery_voltage, Some(24.1));
        assert_eq!(payload.soh, None);
        assert_eq!(payload.battery_temperature, None);
        assert!(!payload.is_empty());
    }

    #[test]
    /// 测试数值字段携带字符串时反序列化失败，而不是被静默转换。
    fn non_numeric_field_is_rejected() {
        let result = serde_json::from_value::<BmsStatusPayload>(json!({ "SOC": "42" }));
        assert!(result.is_err(), "字符串形式的 SOC 不应被接受");
    }

    #[test]
    fn unknown_fields_are_ignored_and_null_means_absent() {
        let payload: BmsStatusPayload =
            serde_json::from_value(json!({ "cellCount": 7, "SOH": null })).expect("解析失败");
        assert!(payload.is_empty());
    }

    #[test]
    fn percentage_range_is_checked() {
        let ok = BmsStatusPayload { soc: Some(100.0), soh: Some(0.0), ..Default::default() };
        assert_eq!(ok.out_of_range_field(), None);

        let bad = BmsStatusPayload { soc: Some(50.0), soh: Some(101.5), ..Default::default() };
        assert_eq!(bad.out_of_range_field(), Some(("SOH", 101.5)));
    }

    #[test]
    fn serialization_skips_absent_fields() {
        let payload = BmsStatusPayload { battery_temperature: Some(61.0), ..Default::default() };
        let json = serde_json::to_value(&payload).expect("序列化失败");
        assert_eq!(json, json!({ "batteryTemperature": 61.0 }));
    }
}
