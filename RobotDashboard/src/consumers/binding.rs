// RobotDashboard/src/consumers/binding.rs

//! 消费者与连接管理器之间的绑定。
//!
//! 绑定建立时表达连接意愿、注册监听器，并在管理器锁内把当前连接状态同步给消费者；
//! 绑定被丢弃时注销它注册的全部监听器。绑定从不关闭连接管理器。

use crate::event::{EventBus, ListenerHandle};
use crate::state::TelemetrySnapshot;
use crate::ws_client::ConnectionManager;
use log::debug;
use std::sync::Arc;

/// 消费者持有的绑定，生命周期与消费者一致。
#[derive(Debug)]
pub struct TelemetryBinding {
    bus: Arc<EventBus>,
    handles: Vec<ListenerHandle>,
}

impl TelemetryBinding {
    /// 绑定数据与连接两类回调。
    pub async fn attach<D, C>(manager: &Arc<ConnectionManager>, on_data: D, on_connection: C) -> Self
    where
        D: Fn(&TelemetrySnapshot) + Send + Sync + 'static,
        C: Fn(bool) + Send + Sync + 'static,
    {
        manager.ensure_connected().await;
        let bus = manager.event_bus();
        let handles = vec![
            bus.register_data_listener(on_data),
            manager.register_connection_listener_synced(on_connection).await,
        ];
        debug!("[遥测绑定] 已绑定数据与连接监听器");
        Self { bus, handles }
    }

    /// 只关心连接状态的消费者使用的绑定。
    pub async fn attach_connection<C>(manager: &Arc<ConnectionManager>, on_connection: C) -> Self
    where
        C: Fn(bool) + Send + Sync + 'static,
    {
        manager.ensure_connected().await;
        let bus = manager.event_bus();
        let handles = vec![manager.register_connection_listener_synced(on_connection).await];
        debug!("[遥测绑定] 已绑定连接监听器");
        Self { bus, handles }
    }
}

impl Drop for TelemetryBinding {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            self.bus.unregister(handle);
        }
        debug!("[遥测绑定] 已注销监听器");
    }
}
