// bridge_sim/src/lib.rs

//! 模拟机器人桥接服务。
//!
//! 在没有真实机器人的环境中替代 rosbridge：接受仪表盘的 WebSocket 连接，
//! 处理 `subscribe` / `unsubscribe`，并按固定间隔在 BMS 话题上推送合成的电池状态。
//!
//! 主要模块包括：
//! - `config`: 监听地址、推送间隔与话题。
//! - `error`: 模拟服务的错误类型。
//! - `session`: 单条客户端连接的订阅与转发。
//! - `simulator`: 合成 BMS 遥测与推送任务。

pub mod config;
pub mod error;
pub mod session;
pub mod simulator;

use config::SimConfig;
use error::SimError;
use log::{error, info};
use rust_websocket_utils::server::transport::{ServerTransport, WsStream};
use simulator::{run_publisher, BatterySimulator};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// 推送广播通道的容量。
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// 在已绑定的监听器上运行模拟服务，直到接受循环出错。
pub async fn serve(listener: TcpListener, config: SimConfig) -> Result<(), SimError> {
    let (tx, _) = broadcast::channel::<String>(FRAME_CHANNEL_CAPACITY);

    let publisher_tx = tx.clone();
    let topic = config.topic.clone();
    let interval = config.publish_interval();
    tokio::spawn(async move {
        if let Err(e) = run_publisher(topic, interval, BatterySimulator::new(), publisher_tx).await {
            error!("[模拟服务] 推送任务异常结束: {}", e);
        }
    });

    info!(
        "[模拟服务] 话题 '{}'，推送间隔 {:?}",
        config.topic,
        config.publish_interval()
    );
    let topic = config.topic.clone();
    let on_connect = move |ws: WsStream, peer: SocketAddr| {
        let frames = tx.subscribe();
        let topic = topic.clone();
        async move { session::run_session(ws, peer, topic, frames).await }
    };
    ServerTransport::serve(listener, on_connect).await?;
    Ok(())
}
