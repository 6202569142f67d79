// bridge_sim/src/simulator.rs

//! 合成 BMS 遥测。
//!
//! 电量从 100% 起每次下降 0.5%，低于 5% 后回到 100%（模拟换电）；
//! 电压随电量线性变化，温度在 35–60 °C 之间往复，便于在仪表盘上观察告警。

use crate::error::SimError;
use common_models::ws_payloads::BmsStatusPayload;
use log::{debug, info};
use rust_websocket_utils::message::BridgeOp;
use std::time::Duration;
use tokio::sync::broadcast;

const SOC_STEP: f64 = 0.5;
const SOC_FLOOR: f64 = 5.0;
const TEMPERATURE_BASE: f64 = 35.0;
const TEMPERATURE_SPAN: u64 = 25;

/// 电池状态生成器。
#[derive(Debug, Clone)]
pub struct BatterySimulator {
    tick: u64,
    soc: f64,
    soh: f64,
}

impl Default for BatterySimulator {
    fn default() -> Self {
        Self { tick: 0, soc: 100.0, soh: 96.0 }
    }
}

impl BatterySimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成下一条 BMS 状态。
    pub fn next_sample(&mut self) -> BmsStatusPayload {
        let phase = self.tick % (2 * TEMPERATURE_SPAN);
        let offset = if phase < TEMPERATURE_SPAN { phase } else { 2 * TEMPERATURE_SPAN - phase };
        let sample = BmsStatusPayload {
            soc: Some(self.soc),
            soh: Some(self.soh),
            battery_current: Some(if self.tick % 2 == 0 { -3.2 } else { -2.8 }),
            battery_voltage: Some(round1(22.0 + 0.05 * self.soc)),
            battery_temperature: Some(TEMPERATURE_BASE + offset as f64),
        };

        self.tick += 1;
        self.soc -= SOC_STEP;
        if self.soc < SOC_FLOOR {
            info!("[电池模拟] 电量低于 {}%，模拟换电", SOC_FLOOR);
            self.soc = 100.0;
        }
        sample
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 把一条样本编码为线上发布帧。
pub fn encode_publish(topic: &str, sample: &BmsStatusPayload) -> Result<String, SimError> {
    let msg = serde_json::to_value(sample).map_err(|e| SimError::Encode(e.to_string()))?;
    BridgeOp::publish(topic, msg).to_json().map_err(|e| SimError::Encode(e.to_string()))
}

/// 按固定间隔生成样本并广播给所有会话。只在编码失败时返回。
pub async fn run_publisher(
    topic: String,
    interval: Duration,
    mut simulator: BatterySimulator,
    tx: broadcast::Sender<String>,
) -> Result<(), SimError> {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let frame = encode_publish(&topic, &simulator.next_sample())?;
        // 没有在线会话时 send 返回错误，属于正常情况
        let receivers = tx.send(frame).unwrap_or(0);
        debug!("[电池模拟] 已推送到 {} 个会话", receivers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn samples_stay_in_range() {
        let mut simulator = BatterySimulator::new();
        for _ in 0..500 {
            let sample = simulator.next_sample();
            assert!(sample.out_of_range_field().is_none(), "{:?}", sample);
            let temperature = sample.battery_temperature.expect("缺少温度");
            assert!((35.0..=60.0).contains(&temperature));
        }
    }

    #[test]
    fn charge_drains_then_resets() {
        let mut simulator = BatterySimulator::new();
        assert_eq!(simulator.next_sample().soc, Some(100.0));
        assert_eq!(simulator.next_sample().soc, Some(99.5));
        let socs: Vec<f64> = (0..400).filter_map(|_| simulator.next_sample().soc).collect();
        assert!(socs.iter().any(|soc| *soc < 10.0));
        assert!(socs.windows(2).any(|w| w[1] > w[0]), "电量应在低于下限后回到 100%");
    }

    #[test]
    fn publish_frame_uses_bridge_field_names() {
        let sample = BmsStatusPayload { soc: Some(17.0), battery_temperature: Some(61.0), ..Default::default() };
        let frame = encode_publish("/dash_board/BMS_status", &sample).expect("编码失败");
        let value: Value = serde_json::from_str(&frame).expect("帧应为合法 JSON");
        assert_eq!(value["op"], "publish");
        assert_eq!(value["topic"], "/dash_board/BMS_status");
        assert_eq!(value["msg"]["SOC"], 17.0);
        assert_eq!(value["msg"]["batteryTemperature"], 61.0);
        assert!(value["msg"].get("SOH").is_none());
    }

    #[tokio::test]
    async fn publisher_broadcasts_frames() {
        let (tx, mut rx) = broadcast::channel(8);
        let task = tokio::spawn(run_publisher(
            "/dash_board/BMS_status".to_string(),
            Duration::from_millis(10),
            BatterySimulator::new(),
            tx,
        ));
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("等待推送超时")
            .expect("接收推送失败");
        assert!(frame.contains("\"op\":\"publish\""));
        task.abort();
    }
}
