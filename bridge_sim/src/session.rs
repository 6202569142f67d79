// bridge_sim/src/session.rs

//! 单条客户端连接的会话。
//!
//! 会话记录客户端订阅的话题，只把已订阅话题的推送转发给客户端。
//! 客户端关闭连接或发送端出错时会话结束。

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rust_websocket_utils::message::BridgeOp;
use rust_websocket_utils::server::transport::{receive_op, WsStream};
use std::collections::HashSet;
use std::net::SocketAddr;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::protocol::Message;

/// 处理一条客户端连接，直到连接结束。
///
/// # 参数
/// * `ws` - 已完成握手的 WebSocket 流。
/// * `peer` - 客户端地址，仅用于日志。
/// * `topic` - 推送帧所属的话题。
/// * `frames` - 推送帧的广播接收端。
pub async fn run_session(ws: WsStream, peer: SocketAddr, topic: String, mut frames: broadcast::Receiver<String>) {
    info!("[会话] 客户端 {} 已连接", peer);
    let (mut ws_sender, mut ws_receiver) = ws.split();
    let mut subscribed: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            incoming = receive_op(&mut ws_receiver) => match incoming {
                Some(Ok(BridgeOp::Subscribe { topic: requested, id })) => {
                    info!("[会话] {} 订阅话题 '{}' (id: {:?})", peer, requested, id);
                    subscribed.insert(requested);
                }
                Some(Ok(BridgeOp::Unsubscribe { topic: requested, .. })) => {
                    info!("[会话] {} 取消订阅话题 '{}'", peer, requested);
                    subscribed.remove(&requested);
                }
                Some(Ok(BridgeOp::Publish { topic: published, .. })) => {
                    debug!("[会话] 忽略客户端 {} 在话题 '{}' 上的发布", peer, published);
                }
                Some(Err(e)) => {
                    warn!("[会话] 与 {} 的连接出错: {}", peer, e);
                    break;
                }
                None => break,
            },
            frame = frames.recv() => match frame {
                Ok(text) if subscribed.contains(&topic) => {
                    if let Err(e) = ws_sender.send(Message::Text(text)).await {
                        warn!("[会话] 向 {} 推送失败: {}", peer, e);
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("[会话] {} 处理过慢，跳过了 {} 条推送", peer, skipped);
                }
                Err(RecvError::Closed) => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }
    info!("[会话] 客户端 {} 已断开", peer);
}
