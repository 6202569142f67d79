// RobotDashboard/src/state.rs

//! 遥测快照的共享状态。
//!
//! `SnapshotStore` 持有每个遥测字段最近一次已知的取值。更新只做合并：
//! 一条消息中缺省的字段永远不会覆盖已有的值。消费者拿到的都是快照的副本。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

/// 从一条话题消息中解析出的遥测样本，每个字段都可以缺省。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TelemetrySample {
    /// 剩余电量百分比 (0–100)。
    pub state_of_charge: Option<f64>,
    /// 健康度百分比 (0–100)。
    pub state_of_health: Option<f64>,
    pub battery_current_amps: Option<f64>,
    pub battery_voltage_volts: Option<f64>,
    pub battery_temperature_celsius: Option<f64>,
}

impl TelemetrySample {
    /// 样本是否没有携带任何字段。
    pub fn is_empty(&self) -> bool {
        *self == TelemetrySample::default()
    }
}

/// 合并后的遥测视图。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub state_of_charge: Option<f64>,
    pub state_of_health: Option<f64>,
    pub battery_current_amps: Option<f64>,
    pub battery_voltage_volts: Option<f64>,
    pub battery_temperature_celsius: Option<f64>,
    /// 最近一次合并的时间 (UTC)。
    pub updated_at: Option<DateTime<Utc>>,
    /// 已合并的消息条数。
    pub sample_count: u64,
}

impl TelemetrySnapshot {
    /// 把一条样本合并进快照；缺省字段保持原值。
    pub fn merge(&mut self, sample: &TelemetrySample) {
        fn keep_known(slot: &mut Option<f64>, incoming: Option<f64>) {
            if incoming.is_some() {
                *slot = incoming;
            }
        }

        keep_known(&mut self.state_of_charge, sample.state_of_charge);
        keep_known(&mut self.state_of_health, sample.state_of_health);
        keep_known(&mut self.battery_current_amps, sample.battery_current_amps);
        keep_known(&mut self.battery_voltage_volts, sample.battery_voltage_volts);
        keep_known(&mut self.battery_temperature_celsius, sample.battery_temperature_celsius);
        self.updated_at = Some(Utc::now());
        self.sample_count += 1;
    }
}

/// 进程内唯一的遥测快照存储，由连接管理器独占写入。
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: Mutex<TelemetrySnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一条样本，返回合并后的快照副本。
    pub fn merge(&self, sample: &TelemetrySample) -> TelemetrySnapshot {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.merge(sample);
        guard.clone()
    }

    /// 当前快照的副本。
    pub fn current(&self) -> TelemetrySnapshot {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 测试两条部分消息依次合并后，两条消息的字段都保留在快照中。
    fn partial_updates_accumulate() {
        let store = SnapshotStore::new();
        store.merge(&TelemetrySample { state_of_charge: Some(42.0), ..Default::default() });
        let merged = store.merge(&TelemetrySample { battery_voltage_volts: Some(24.1), ..Default::default() });

        assert_eq!(merged.state_of_charge, Some(42.0));
        assert_eq!(merged.battery_voltage_volts, Some(24.1));
        assert_eq!(merged.state_of_health, None);
        assert_eq!(merged.sample_count, 2);
        assert!(merged.updated_at.is_some());
        assert_eq!(store.current(), merged);
    }

    #[test]
    fn newer_values_replace_older_ones() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.merge(&TelemetrySample { battery_temperature_celsius: Some(40.0), ..Default::default() });
        snapshot.merge(&TelemetrySample {
            battery_temperature_celsius: Some(61.0),
            state_of_charge: Some(17.0),
            ..Default::default()
        });
        assert_eq!(snapshot.battery_temperature_celsius, Some(61.0));
        assert_eq!(snapshot.state_of_charge, Some(17.0));
    }

    #[test]
    fn empty_sample_keeps_values() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.merge(&TelemetrySample { state_of_health: Some(95.0), ..Default::default() });
        snapshot.merge(&TelemetrySample::default());
        assert_eq!(snapshot.state_of_health, Some(95.0));
        assert!(TelemetrySample::default().is_empty());
    }

    #[test]
    fn copies_are_detached_from_the_store() {
        let store = SnapshotStore::new();
        let mut copy = store.merge(&TelemetrySample { state_of_charge: Some(80.0), ..Default::default() });
        copy.state_of_charge = Some(1.0);
        assert_eq!(store.current().state_of_charge, Some(80.0));
    }
}
