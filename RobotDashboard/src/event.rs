// RobotDashboard/src/event.rs

//! 仪表盘内部的事件总线。
//!
//! 事件只有两类：
//! - `data`：遥测快照更新，监听器收到合并后的快照副本；
//! - `connection`：到桥接服务的连接状态变化，监听器收到 `true`/`false`。
//!
//! 派发是同步的，按注册顺序依次调用。派发开始时会对监听器列表做快照，
//! 派发过程中注册或注销的监听器只影响之后的通知。单个监听器 panic 会被捕获并记录，
//! 不影响其余监听器。

use crate::state::TelemetrySnapshot;
use log::{debug, error};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// 遥测数据事件的名称。
pub const DATA_EVENT: &str = "data";

/// 连接状态事件的名称。
pub const CONNECTION_EVENT: &str = "connection";

/// 数据事件监听器。
pub type DataListener = Arc<dyn Fn(&TelemetrySnapshot) + Send + Sync>;

/// 连接事件监听器。
pub type ConnectionListener = Arc<dyn Fn(bool) + Send + Sync>;

/// 监听器类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Data,
    Connection,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Data => f.write_str(DATA_EVENT),
            ListenerKind::Connection => f.write_str(CONNECTION_EVENT),
        }
    }
}

/// 注册监听器时返回的句柄，用于之后注销。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    id: u64,
    kind: ListenerKind,
}

impl ListenerHandle {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

/// 事件总线。
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    data_listeners: Mutex<Vec<(u64, DataListener)>>,
    connection_listeners: Mutex<Vec<(u64, ConnectionListener)>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("data_listeners", &self.data_listener_count())
            .field("connection_listeners", &self.connection_listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// 注册一个数据事件监听器。
    pub fn register_data_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&TelemetrySnapshot) + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        let listener: DataListener = Arc::new(listener);
        lock(&self.data_listeners).push((id, listener));
        debug!("[事件总线] 注册 {} 监听器 #{}", DATA_EVENT, id);
        ListenerHandle { id, kind: ListenerKind::Data }
    }

    /// 注册一个连接事件监听器。
    pub fn register_connection_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        let listener: ConnectionListener = Arc::new(listener);
        lock(&self.connection_listeners).push((id, listener));
        debug!("[事件总线] 注册 {} 监听器 #{}", CONNECTION_EVENT, id);
        ListenerHandle { id, kind: ListenerKind::Connection }
    }

    /// 注销监听器。返回该监听器此前是否仍处于注册状态；重复注销返回 `false`。
    pub fn unregister(&self, handle: ListenerHandle) -> bool {
        let removed = match handle.kind {
            ListenerKind::Data => remove_by_id(&self.data_listeners, handle.id),
            ListenerKind::Connection => remove_by_id(&self.connection_listeners, handle.id),
        };
        if removed {
            debug!("[事件总线] 注销 {} 监听器 #{}", handle.kind, handle.id);
        }
        removed
    }

    /// 向所有数据监听器派发快照。
    pub fn publish_data(&self, snapshot: &TelemetrySnapshot) {
        let listeners = snapshot_listeners(&self.data_listeners);
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                error!("[事件总线] {} 监听器 #{} 在处理事件时 panic，已跳过", DATA_EVENT, id);
            }
        }
    }

    /// 向所有连接监听器派发连接状态。
    pub fn publish_connection(&self, connected: bool) {
        let listeners = snapshot_listeners(&self.connection_listeners);
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(connected))).is_err() {
                error!("[事件总线] {} 监听器 #{} 在处理事件时 panic，已跳过", CONNECTION_EVENT, id);
            }
        }
    }

    pub fn data_listener_count(&self) -> usize {
        lock(&self.data_listeners).len()
    }

    pub fn connection_listener_count(&self) -> usize {
        lock(&self.connection_listeners).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn remove_by_id<T>(listeners: &Mutex<Vec<(u64, T)>>, id: u64) -> bool {
    let mut guard = lock(listeners);
    let before = guard.len();
    guard.retain(|(existing, _)| *existing != id);
    guard.len() != before
}

fn snapshot_listeners<T: Clone>(listeners: &Mutex<Vec<(u64, T)>>) -> Vec<(u64, T)> {
    lock(listeners).clone()
}
