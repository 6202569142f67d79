// RobotDashboard/src/ws_client/service.rs

//! 到机器人桥接服务的连接管理器。
//!
//! 整个进程只持有一条到桥接服务的连接，由 `ConnectionManager` 独占：
//! 它负责连接状态机、断线后的固定间隔重连、连接建立后的话题重新订阅，
//! 以及把入站消息交给订阅注册表解析、合并和派发。
//!
//! 状态机：`Disconnected → Connecting → Connected → Disconnected → …`，
//! 连接建立前失败时为 `Connecting → Disconnected`。
//!
//! 所有可变状态（连接代次、发送端、连接任务、重连定时器、停止标记）都放在同一把
//! `tokio::sync::Mutex` 后面，每次状态迁移、订阅下发、消息派发和连接通知都在持锁期间完成。
//! 每次连接尝试都带着自己的代次 (epoch) 号，异步回来的结果若代次已过期则直接丢弃。

use crate::config::BridgeConfig;
use crate::error::TransportError;
use crate::event::{EventBus, ListenerHandle};
use crate::state::{SnapshotStore, TelemetrySnapshot};
use crate::ws_client::subscriptions::{SubscriptionRegistry, TopicHandler};
use common_models::enums::ConnectionState;
use log::{debug, error, info, warn};
use rust_websocket_utils::client::transport::{
    close, connect_client_with_timeout, receive_message, ClientConnection, ClientSink, ClientStream,
};
use rust_websocket_utils::frame::send_op;
use rust_websocket_utils::message::{BridgeMessage, BridgeOp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::JoinHandle;

/// 默认重连间隔。
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// 默认连接超时。
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// 关闭连接时等待 Close 帧发送完成的上限。
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// 连接参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// 桥接服务 URL (`ws://` / `wss://`)。
    pub url: String,
    /// 断线后到下一次连接尝试之间的固定间隔。
    pub reconnect_delay: Duration,
    /// 单次连接尝试（含握手）的超时。
    pub connect_timeout: Duration,
}

impl ConnectionOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = limit;
        self
    }
}

impl From<&BridgeConfig> for ConnectionOptions {
    fn from(config: &BridgeConfig) -> Self {
        ConnectionOptions::new(config.url.clone())
            .with_reconnect_delay(Duration::from_millis(config.reconnect_delay_ms))
            .with_connect_timeout(Duration::from_millis(config.connect_timeout_ms))
    }
}

/// 挂起中的重连定时器。
struct ReconnectTimer {
    id: u64,
    handle: JoinHandle<()>,
}

/// 受管理器互斥锁保护的状态。
#[derive(Default)]
struct ManagerInner {
    /// 连接代次；每次连接尝试和关闭时递增。
    epoch: u64,
    /// 已建立连接的发送端。
    sink: Option<ClientSink>,
    /// 当前代次的连接/读取任务。
    connection_task: Option<JoinHandle<()>>,
    /// 任一时刻至多一个挂起的重连定时器。
    reconnect_timer: Option<ReconnectTimer>,
    next_timer_id: u64,
    /// `shutdown()` 之后为真，管理器不再发起任何连接。
    stopped: bool,
}

/// 连接管理器。
///
/// 由组合根创建一次并以 `Arc` 共享；消费者只能通过 `ensure_connected()` 表达连接意愿，
/// 不能直接操作连接。最后一个 `Arc` 被释放时，后台任务会被一并中止。
pub struct ConnectionManager {
    options: ConnectionOptions,
    inner: TokioMutex<ManagerInner>,
    /// 连接状态的同步视图，只在持有 `inner` 锁时写入。
    state: StdMutex<ConnectionState>,
    attempts: AtomicU64,
    snapshot: Arc<SnapshotStore>,
    bus: Arc<EventBus>,
    registry: SubscriptionRegistry,
    self_ref: Weak<ConnectionManager>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("options", &self.options)
            .field("state", &self.state())
            .field("attempts", &self.connection_attempts())
            .field("registry", &self.registry)
            .finish()
    }
}

impl ConnectionManager {
    /// 创建连接管理器。创建后处于 `Disconnected`，不会自动连接。
    pub fn new(options: ConnectionOptions) -> Arc<Self> {
        info!("[ConnectionManager] 正在初始化，桥接服务 URL: {}", options.url);
        let snapshot = Arc::new(SnapshotStore::new());
        let bus = Arc::new(EventBus::new());
        Arc::new_cyclic(|self_ref| Self {
            registry: SubscriptionRegistry::new(snapshot.clone(), bus.clone()),
            options,
            inner: TokioMutex::new(ManagerInner::default()),
            state: StdMutex::new(ConnectionState::Disconnected),
            attempts: AtomicU64::new(0),
            snapshot,
            bus,
            self_ref: self_ref.clone(),
        })
    }

    // --- 访问器 ---

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// 当前连接状态。
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// 当前遥测快照的副本。
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot.current()
    }

    /// 累计发起的连接尝试次数（诊断用）。
    pub fn connection_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// 是否有挂起的重连定时器。
    pub async fn reconnect_pending(&self) -> bool {
        self.inner.lock().await.reconnect_timer.is_some()
    }

    // --- 对外操作 ---

    /// 表达"需要连接"的意愿。
    ///
    /// 已在连接中、已连接、有挂起的重连定时器或管理器已关闭时什么都不做；
    /// 否则进入 `Connecting` 并发起一次连接尝试。进程内同一时刻至多一个连接尝试。
    pub async fn ensure_connected(&self) {
        let mut inner = self.inner.lock().await;
        if inner.stopped {
            debug!("[ConnectionManager] 管理器已关闭，忽略 ensure_connected");
            return;
        }
        let state = self.state();
        if state != ConnectionState::Disconnected {
            debug!("[ConnectionManager] 当前状态为 {}，忽略 ensure_connected", state);
            return;
        }
        if inner.reconnect_timer.is_some() {
            debug!("[ConnectionManager] 已有挂起的重连定时器，忽略 ensure_connected");
            return;
        }
        self.start_attempt(&mut inner);
    }

    /// 订阅话题。已连接且该话题尚未在线上订阅时立即发送订阅操作；
    /// 否则在下一次连接建立时统一订阅。
    pub async fn subscribe(&self, topic: &str, handler: TopicHandler) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        if !self.registry.subscribe(topic, handler) {
            return Ok(());
        }
        match inner.sink.as_mut() {
            Some(sink) => {
                info!("[ConnectionManager] 在线上订阅话题 '{}'", topic);
                send_op(sink, &BridgeOp::subscribe(topic))
                    .await
                    .map_err(|e| TransportError::SendFailed(e.to_string()))
            }
            None => Ok(()),
        }
    }

    /// 取消订阅话题。该话题此前已在线上订阅时发送取消订阅操作。
    pub async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        if !self.registry.unsubscribe(topic) {
            return Ok(());
        }
        match inner.sink.as_mut() {
            Some(sink) => {
                info!("[ConnectionManager] 在线上取消订阅话题 '{}'", topic);
                send_op(sink, &BridgeOp::unsubscribe(topic))
                    .await
                    .map_err(|e| TransportError::SendFailed(e.to_string()))
            }
            None => Ok(()),
        }
    }

    /// 注册连接监听器，并立即把当前连接状态回报给它。
    ///
    /// 注册与回报都在持有管理器锁期间完成，而所有连接通知也只在持锁期间发出，
    /// 因此回报的初始状态不会晚于、也不会覆盖之后的任何通知。
    pub async fn register_connection_listener_synced<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let _inner = self.inner.lock().await;
        let listener = Arc::new(listener);
        let registered = listener.clone();
        let handle = self.bus.register_connection_listener(move |connected| registered(connected));
        listener(self.is_connected());
        handle
    }

    /// 关闭管理器。
    ///
    /// 取消挂起的重连定时器（即使正处于等待中），已连接时发送 Close 帧，中止连接任务，
    /// 进入 `Disconnected`，状态有变化时通知 `false`。之后不会再发起任何连接。可重复调用。
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        let first_call = !inner.stopped;
        inner.stopped = true;
        inner.epoch += 1;

        if let Some(timer) = inner.reconnect_timer.take() {
            debug!("[ConnectionManager] 取消挂起的重连定时器 #{}", timer.id);
            timer.handle.abort();
        }
        if let Some(mut sink) = inner.sink.take() {
            match tokio::time::timeout(CLOSE_FRAME_TIMEOUT, close(&mut sink)).await {
                Ok(Ok(())) => debug!("[ConnectionManager] 已发送 Close 帧"),
                Ok(Err(e)) => debug!("[ConnectionManager] 发送 Close 帧失败: {}", e),
                Err(_) => debug!("[ConnectionManager] 发送 Close 帧超时"),
            }
        }
        if let Some(task) = inner.connection_task.take() {
            task.abort();
        }
        self.registry.on_disconnected();

        let previous = self.set_state(ConnectionState::Disconnected);
        if first_call {
            info!("[ConnectionManager] 管理器已关闭");
        }
        if previous != ConnectionState::Disconnected {
            self.bus.publish_connection(false);
        }
    }

    // --- 内部：状态迁移 ---

    fn set_state(&self, next: ConnectionState) -> ConnectionState {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *guard;
        *guard = next;
        if previous != next {
            info!("[ConnectionManager] 连接状态: {} -> {}", previous, next);
        }
        previous
    }

    /// 发起一次新的连接尝试。调用方必须持有 `inner` 锁。
    fn start_attempt(&self, inner: &mut ManagerInner) {
        inner.epoch += 1;
        let epoch = inner.epoch;
        self.set_state(ConnectionState::Connecting);
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "[ConnectionManager] 第 {} 次连接尝试 (代次 {})，目标: {}",
            attempt, epoch, self.options.url
        );

        if let Some(old) = inner.connection_task.take() {
            old.abort();
        }
        inner.connection_task = Some(tokio::spawn(run_connection(
            self.self_ref.clone(),
            epoch,
            self.options.url.clone(),
            self.options.connect_timeout,
        )));
    }

    /// 连接建立。代次过期时返回 `None`，调用方应直接丢弃该连接。
    async fn handle_open(&self, epoch: u64, connection: ClientConnection) -> Option<ClientStream> {
        let mut inner = self.inner.lock().await;
        if inner.stopped || inner.epoch != epoch {
            debug!("[ConnectionManager] 丢弃过期代次 {} 的连接", epoch);
            return None;
        }

        let (mut sink, stream) = connection.into_split();
        if let Some(timer) = inner.reconnect_timer.take() {
            timer.handle.abort();
        }

        // 重新订阅全部完成之前保持 Connecting，外部看不到 Connected
        for topic in self.registry.on_connected() {
            debug!("[ConnectionManager] 重新订阅话题 '{}'", topic);
            if let Err(e) = send_op(&mut sink, &BridgeOp::subscribe(&topic)).await {
                self.fail_locked(&mut inner, TransportError::SendFailed(e.to_string()));
                return None;
            }
        }
        inner.sink = Some(sink);
        self.set_state(ConnectionState::Connected);
        info!("[ConnectionManager] 已连接到桥接服务 (代次 {})", epoch);
        self.bus.publish_connection(true);
        Some(stream)
    }

    /// 处理一条入站消息。返回读取循环是否应继续。
    async fn handle_message(&self, epoch: u64, message: BridgeMessage) -> bool {
        let inner = self.inner.lock().await;
        if inner.stopped || inner.epoch != epoch {
            return false;
        }
        if !message.carries_data() {
            debug!("[ConnectionManager] 忽略非数据帧 (op={:?})", message.op);
            return true;
        }
        self.registry.on_message(message.topic.as_deref(), &message.payload);
        true
    }

    /// 连接失败或断开。
    async fn handle_failure(&self, epoch: u64, reason: TransportError) {
        let mut inner = self.inner.lock().await;
        if inner.stopped || inner.epoch != epoch {
            debug!("[ConnectionManager] 忽略过期代次 {} 的失败: {}", epoch, reason);
            return;
        }
        self.fail_locked(&mut inner, reason);
    }

    /// 进入 `Disconnected`，清理发送端与线上订阅，通知 `false` 并安排一次重连。
    fn fail_locked(&self, inner: &mut ManagerInner, reason: TransportError) {
        let previous = self.set_state(ConnectionState::Disconnected);
        match previous {
            ConnectionState::Connected => warn!("[ConnectionManager] 连接断开: {}", reason),
            _ => error!("[ConnectionManager] 连接尝试失败: {}", reason),
        }
        inner.sink = None;
        // 失败发生在连接任务内部，这里只分离句柄
        inner.connection_task = None;
        self.registry.on_disconnected();
        self.bus.publish_connection(false);
        self.schedule_reconnect(inner);
    }

    /// 安排一次重连。已有挂起的定时器或已关闭时什么都不做。
    fn schedule_reconnect(&self, inner: &mut ManagerInner) {
        if inner.stopped || inner.reconnect_timer.is_some() {
            return;
        }
        inner.next_timer_id += 1;
        let id = inner.next_timer_id;
        let delay = self.options.reconnect_delay;
        let manager = self.self_ref.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(manager) = manager.upgrade() {
                manager.on_reconnect_timer(id).await;
            }
        });
        inner.reconnect_timer = Some(ReconnectTimer { id, handle });
        info!("[ConnectionManager] 将在 {:?} 后重连", delay);
    }

    async fn on_reconnect_timer(&self, id: u64) {
        let mut inner = self.inner.lock().await;
        match &inner.reconnect_timer {
            Some(timer) if timer.id == id => {}
            _ => return,
        }
        // 定时器任务就是当前任务，只清除记录
        inner.reconnect_timer = None;
        if inner.stopped || self.state() != ConnectionState::Disconnected {
            return;
        }
        self.start_attempt(&mut inner);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Some(timer) = inner.reconnect_timer.take() {
            timer.handle.abort();
        }
        if let Some(task) = inner.connection_task.take() {
            task.abort();
        }
    }
}

/// 单个代次的连接任务：建立连接，然后按到达顺序读取并派发入站消息。
async fn run_connection(manager: Weak<ConnectionManager>, epoch: u64, url: String, limit: Duration) {
    let result = connect_client_with_timeout(&url, limit).await;
    let mut stream = {
        let Some(this) = manager.upgrade() else { return };
        match result {
            Ok(connection) => match this.handle_open(epoch, connection).await {
                Some(stream) => stream,
                None => return,
            },
            Err(e) => {
                this.handle_failure(epoch, TransportError::from(e)).await;
                return;
            }
        }
    };

    loop {
        let next = receive_message(&mut stream).await;
        let Some(this) = manager.upgrade() else { return };
        match next {
            Some(Ok(message)) => {
                if !this.handle_message(epoch, message).await {
                    return;
                }
            }
            Some(Err(e)) if !e.is_fatal() => {
                warn!("[ConnectionManager] 丢弃无法解析的入站帧: {}", e);
            }
            Some(Err(e)) => {
                this.handle_failure(epoch, TransportError::Closed(e.to_string())).await;
                return;
            }
            None => {
                this.handle_failure(epoch, TransportError::Closed("对端关闭了连接".to_string()))
                    .await;
                return;
            }
        }
    }
}
