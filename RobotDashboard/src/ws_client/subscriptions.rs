// RobotDashboard/src/ws_client/subscriptions.rs

//! 话题订阅注册表。
//!
//! 注册表记录每个话题的处理器（按注册顺序），以及当前连接上已经下发过订阅的话题集合。
//! 传输层不会在断线后保留订阅，因此每次连接建立后都要把全部话题重新订阅一遍。

use crate::error::MalformedMessageError;
use crate::event::EventBus;
use crate::state::{SnapshotStore, TelemetrySample, TelemetrySnapshot};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 话题处理器：把消息体解析为遥测样本。
pub type TopicHandler = Arc<dyn Fn(&Value) -> Result<TelemetrySample, MalformedMessageError> + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    /// 按注册顺序排列的话题及其处理器。
    topics: Vec<(String, TopicHandler)>,
    /// 当前连接上已下发订阅的话题。
    on_wire: HashSet<String>,
    connected: bool,
}

impl RegistryInner {
    fn handler(&self, topic: &str) -> Option<TopicHandler> {
        self.topics.iter().find(|(name, _)| name == topic).map(|(_, handler)| handler.clone())
    }
}

/// 话题订阅注册表。
pub struct SubscriptionRegistry {
    inner: Mutex<RegistryInner>,
    snapshot: Arc<SnapshotStore>,
    bus: Arc<EventBus>,
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SubscriptionRegistry")
            .field("topics", &inner.topics.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>())
            .field("on_wire", &inner.on_wire)
            .field("connected", &inner.connected)
            .finish()
    }
}

impl SubscriptionRegistry {
    pub fn new(snapshot: Arc<SnapshotStore>, bus: Arc<EventBus>) -> Self {
        Self { inner: Mutex::new(RegistryInner::default()), snapshot, bus }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 注册（或替换）话题处理器。
    ///
    /// 返回是否需要立即在线上发送订阅：只有在已连接且该话题尚未在线上订阅时才为 `true`。
    pub fn subscribe(&self, topic: &str, handler: TopicHandler) -> bool {
        let mut inner = self.lock();
        match inner.topics.iter_mut().find(|(name, _)| name == topic) {
            Some(entry) => {
                debug!("[订阅注册表] 话题 '{}' 已注册，替换处理器", topic);
                entry.1 = handler;
            }
            None => {
                info!("[订阅注册表] 注册话题 '{}'", topic);
                inner.topics.push((topic.to_string(), handler));
            }
        }
        if inner.connected && !inner.on_wire.contains(topic) {
            inner.on_wire.insert(topic.to_string());
            true
        } else {
            false
        }
    }

    /// 移除话题。返回是否需要在线上发送取消订阅（该话题此前已在线上订阅）。
    pub fn unsubscribe(&self, topic: &str) -> bool {
        let mut inner = self.lock();
        let before = inner.topics.len();
        inner.topics.retain(|(name, _)| name != topic);
        if inner.topics.len() != before {
            info!("[订阅注册表] 移除话题 '{}'", topic);
        }
        inner.on_wire.remove(topic)
    }

    /// 连接建立：重置线上订阅集合，返回需要订阅的全部话题（按注册顺序）。
    pub fn on_connected(&self) -> Vec<String> {
        let mut inner = self.lock();
        inner.connected = true;
        let topics: Vec<String> = inner.topics.iter().map(|(name, _)| name.clone()).collect();
        inner.on_wire = topics.iter().cloned().collect();
        topics
    }

    /// 连接断开：线上订阅随连接一起失效。
    pub fn on_disconnected(&self) {
        let mut inner = self.lock();
        inner.connected = false;
        inner.on_wire.clear();
    }

    /// 处理一条入站消息。
    ///
    /// 成功解析时合并进快照并派发数据事件，返回合并后的快照；
    /// 没有对应处理器或消息格式错误时丢弃该消息并返回 `None`。
    pub fn on_message(&self, topic: Option<&str>, payload: &Value) -> Option<TelemetrySnapshot> {
        let (topic, handler) = {
            let inner = self.lock();
            let resolved = match topic {
                Some(name) => Some(name.to_string()),
                // 未声明话题的帧只有在唯一注册话题时才能归属
                None if inner.topics.len() == 1 => inner.topics.first().map(|(name, _)| name.clone()),
                None => None,
            };
            let Some(resolved) = resolved else {
                debug!("[订阅注册表] 收到未声明话题的消息，且注册话题不唯一，已丢弃");
                return None;
            };
            let Some(handler) = inner.handler(&resolved) else {
                debug!("[订阅注册表] 话题 '{}' 没有处理器，消息已丢弃", resolved);
                return None;
            };
            (resolved, handler)
        };

        match handler(payload) {
            Ok(sample) => {
                let merged = self.snapshot.merge(&sample);
                debug!("[订阅注册表] 话题 '{}' 的消息已合并 (第 {} 条)", topic, merged.sample_count);
                self.bus.publish_data(&merged);
                Some(merged)
            }
            Err(e) => {
                warn!("[订阅注册表] 话题 '{}' 的消息格式错误，已丢弃: {}", topic, e);
                None
            }
        }
    }

    /// 已注册的全部话题（按注册顺序）。
    pub fn topics(&self) -> Vec<String> {
        self.lock().topics.iter().map(|(name, _)| name.clone()).collect()
    }

    /// 话题当前是否已在线上订阅。
    pub fn is_on_wire(&self, topic: &str) -> bool {
        self.lock().on_wire.contains(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws_client::topics::bms_status_handler;
    use common_models::ws_payloads::BMS_STATUS_TOPIC;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> (SubscriptionRegistry, Arc<SnapshotStore>, Arc<EventBus>) {
        let snapshot = Arc::new(SnapshotStore::new());
        let bus = Arc::new(EventBus::new());
        (SubscriptionRegistry::new(snapshot.clone(), bus.clone()), snapshot, bus)
    }

    #[test]
    /// 测试同一话题订阅两次只需要一次线上订阅。
    fn duplicate_subscribe_needs_one_wire_subscribe() {
        let (registry, _, _) = registry();
        registry.on_connected();
        assert!(registry.subscribe(BMS_STATUS_TOPIC, bms_status_handler()));
        assert!(!registry.subscribe(BMS_STATUS_TOPIC, bms_status_handler()));
        assert_eq!(registry.topics(), vec![BMS_STATUS_TOPIC.to_string()]);
    }

    #[test]
    fn subscribe_while_disconnected_defers_to_next_connect() {
        let (registry, _, _) = registry();
        assert!(!registry.subscribe("/a", bms_status_handler()));
        assert!(!registry.subscribe("/b", bms_status_handler()));
        assert!(!registry.is_on_wire("/a"));

        assert_eq!(registry.on_connected(), vec!["/a".to_string(), "/b".to_string()]);
        assert!(registry.is_on_wire("/a") && registry.is_on_wire("/b"));

        registry.on_disconnected();
        assert!(!registry.is_on_wire("/a"));
        assert_eq!(registry.on_connected().len(), 2, "重连后应重新订阅全部话题");
    }

    #[test]
    fn second_handler_replaces_first() {
        let (registry, snapshot, _) = registry();
        let first_calls = Arc::new(AtomicUsize::new(0));
        let counter = first_calls.clone();
        registry.subscribe(
            "/t",
            Arc::new(move |_: &Value| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, MalformedMessageError>(TelemetrySample::default())
            }),
        );
        registry.subscribe("/t", bms_status_handler());

        registry.on_message(Some("/t"), &json!({ "SOC": 50 }));
        assert_eq!(first_calls.load(Ordering::SeqCst), 0);
        assert_eq!(snapshot.current().state_of_charge, Some(50.0));
    }

    #[test]
    /// 测试消息合并进快照并派发数据事件。
    fn message_is_merged_and_published() {
        let (registry, snapshot, bus) = registry();
        registry.subscribe(BMS_STATUS_TOPIC, bms_status_handler());
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        bus.register_data_listener(move |s| sink.lock().unwrap().push(s.clone()));

        registry.on_message(Some(BMS_STATUS_TOPIC), &json!({ "SOC": 42 }));
        let merged = registry
            .on_message(Some(BMS_STATUS_TOPIC), &json!({ "batteryVoltage": 24.1 }))
            .expect("消息应被合并");

        assert_eq!(merged.state_of_charge, Some(42.0));
        assert_eq!(merged.battery_voltage_volts, Some(24.1));
        assert_eq!(snapshot.current(), merged);
        assert_eq!(received.lock().unwrap().len(), 2);
    }

    #[test]
    fn unknown_topic_and_malformed_messages_are_dropped() {
        let (registry, snapshot, bus) = registry();
        registry.subscribe(BMS_STATUS_TOPIC, bms_status_handler());
        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        bus.register_data_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.on_message(Some("/unknown"), &json!({ "SOC": 1 })).is_none());
        assert!(registry.on_message(Some(BMS_STATUS_TOPIC), &json!({ "SOC": "x" })).is_none());
        assert!(registry.on_message(Some(BMS_STATUS_TOPIC), &json!("text")).is_none());
        assert_eq!(events.load(Ordering::SeqCst), 0);
        assert_eq!(snapshot.current().sample_count, 0);
    }

    #[test]
    fn untopiced_frame_goes_to_sole_topic_only() {
        let (registry, snapshot, _) = registry();
        registry.subscribe(BMS_STATUS_TOPIC, bms_status_handler());
        assert!(registry.on_message(None, &json!({ "SOH": 88 })).is_some());
        assert_eq!(snapshot.current().state_of_health, Some(88.0));

        registry.subscribe("/second", bms_status_handler());
        assert!(registry.on_message(None, &json!({ "SOH": 10 })).is_none());
        assert_eq!(snapshot.current().state_of_health, Some(88.0));
    }

    #[test]
    fn unsubscribe_reports_wire_state() {
        let (registry, _, _) = registry();
        registry.subscribe("/a", bms_status_handler());
        assert!(!registry.unsubscribe("/a"), "未连接时不需要线上取消订阅");

        registry.subscribe("/a", bms_status_handler());
        registry.on_connected();
        assert!(registry.unsubscribe("/a"));
        assert!(!registry.unsubscribe("/a"));
        assert!(registry.topics().is_empty());
    }
}
