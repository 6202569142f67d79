// RobotDashboard/src/consumers/status_bar.rs

//! 状态栏：把遥测快照渲染为一行文本。
//!
//! 显示规则：
//! - `BATTERY`：SOC 百分比，低于 20 为严重；
//! - `SOH`：健康度百分比，低于 80 为警告；
//! - `VOLTAGE` / `CURRENT`：一位小数；
//! - `TEMP`：一位小数，高于 50.0 °C 为严重。
//!
//! 尚未收到的字段显示为 `--`。

use crate::consumers::binding::TelemetryBinding;
use crate::state::TelemetrySnapshot;
use crate::ws_client::ConnectionManager;
use log::{info, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

const LOW_CHARGE_THRESHOLD: f64 = 20.0;
const LOW_HEALTH_THRESHOLD: f64 = 80.0;
const HIGH_TEMPERATURE_THRESHOLD: f64 = 50.0;
const UNKNOWN: &str = "--";

/// 读数的告警级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

/// 状态栏上的一项读数。
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub label: &'static str,
    pub text: String,
    pub severity: Severity,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Normal => write!(f, "{}: {}", self.label, self.text),
            Severity::Warning => write!(f, "{}: {} (!)", self.label, self.text),
            Severity::Critical => write!(f, "{}: {} (!!)", self.label, self.text),
        }
    }
}

/// 一帧状态栏内容。
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub connected: bool,
    pub readings: Vec<Reading>,
}

impl StatusLine {
    /// 按显示规则渲染快照。
    pub fn render(snapshot: &TelemetrySnapshot, connected: bool) -> Self {
        let readings = vec![
            Reading {
                label: "BATTERY",
                text: with_unit(snapshot.state_of_charge.map(|v| v.to_string()), "%"),
                severity: flag(snapshot.state_of_charge, |v| v < LOW_CHARGE_THRESHOLD, Severity::Critical),
            },
            Reading {
                label: "SOH",
                text: with_unit(snapshot.state_of_health.map(|v| v.to_string()), "%"),
                severity: flag(snapshot.state_of_health, |v| v < LOW_HEALTH_THRESHOLD, Severity::Warning),
            },
            Reading {
                label: "VOLTAGE",
                text: with_unit(snapshot.battery_voltage_volts.map(one_decimal), "V"),
                severity: Severity::Normal,
            },
            Reading {
                label: "CURRENT",
                text: with_unit(snapshot.battery_current_amps.map(one_decimal), "A"),
                severity: Severity::Normal,
            },
            Reading {
                label: "TEMP",
                text: with_unit(snapshot.battery_temperature_celsius.map(one_decimal), "°C"),
                severity: flag(
                    snapshot.battery_temperature_celsius,
                    |v| v > HIGH_TEMPERATURE_THRESHOLD,
                    Severity::Critical,
                ),
            },
        ];
        Self { connected, readings }
    }

    pub fn reading(&self, label: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.label == label)
    }

    /// 所有读数中最高的告警级别。
    pub fn worst_severity(&self) -> Severity {
        self.readings.iter().map(|r| r.severity).max().unwrap_or(Severity::Normal)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", if self.connected { "ONLINE" } else { "OFFLINE" })?;
        for reading in &self.readings {
            write!(f, " | {}", reading)?;
        }
        Ok(())
    }
}

fn one_decimal(value: f64) -> String {
    format!("{:.1}", value)
}

fn with_unit(text: Option<String>, unit: &str) -> String {
    match text {
        Some(text) => format!("{}{}", text, unit),
        None => UNKNOWN.to_string(),
    }
}

fn flag(value: Option<f64>, breached: impl Fn(f64) -> bool, level: Severity) -> Severity {
    match value {
        Some(v) if breached(v) => level,
        _ => Severity::Normal,
    }
}

/// 状态栏消费者：每次数据或连接变化时重新渲染并记录日志。
pub struct StatusBar {
    connected: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<StatusLine>>>,
    _binding: TelemetryBinding,
}

impl StatusBar {
    pub async fn attach(manager: &Arc<ConnectionManager>) -> Self {
        let connected = Arc::new(AtomicBool::new(false));
        let latest: Arc<Mutex<Option<StatusLine>>> = Arc::new(Mutex::new(None));

        let data_connected = connected.clone();
        let data_latest = latest.clone();
        let conn_flag = connected.clone();
        let binding = TelemetryBinding::attach(
            manager,
            move |snapshot| {
                let line = StatusLine::render(snapshot, data_connected.load(Ordering::SeqCst));
                match line.worst_severity() {
                    Severity::Normal => info!("[状态栏] {}", line),
                    _ => warn!("[状态栏] {}", line),
                }
                *data_latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(line);
            },
            move |is_connected| {
                let previous = conn_flag.swap(is_connected, Ordering::SeqCst);
                if previous != is_connected {
                    info!("[状态栏] 遥测链路: {}", if is_connected { "ONLINE" } else { "OFFLINE" });
                }
            },
        )
        .await;

        Self { connected, latest, _binding: binding }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// 最近一次由数据事件渲染的状态栏。
    pub fn latest(&self) -> Option<StatusLine> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// 以给定快照和当前连接状态渲染状态栏。
    pub fn render(&self, snapshot: &TelemetrySnapshot) -> StatusLine {
        StatusLine::render(snapshot, self.is_connected())
    }
}
