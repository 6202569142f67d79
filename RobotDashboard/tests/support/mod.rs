// RobotDashboard/tests/support/mod.rs

//! 集成测试共用的模拟桥接服务。
//!
//! `MockBridge` 绑定 `127.0.0.1:0`，用 `ServerTransport::serve` 接受连接，
//! 记录每条连接收到的操作，并可以向全部在线连接推送帧或关闭它们。

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use rust_websocket_utils::message::BridgeOp;
use rust_websocket_utils::server::transport::{receive_op, ServerTransport, WsStream};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;

/// 等待条件成立的默认上限。
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// 模拟桥接服务记录的事件。
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Connected(u64),
    Op(u64, BridgeOp),
    Disconnected(u64),
}

#[derive(Default)]
struct Shared {
    log: Mutex<Vec<(Instant, BridgeEvent)>>,
    outbound: Mutex<HashMap<u64, mpsc::UnboundedSender<Message>>>,
    next_id: AtomicU64,
    drop_next: AtomicUsize,
}

impl Shared {
    fn record(&self, event: BridgeEvent) {
        self.log.lock().unwrap().push((Instant::now(), event));
    }
}

pub struct MockBridge {
    addr: SocketAddr,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

impl MockBridge {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定模拟桥接服务端口失败");
        let addr = listener.local_addr().expect("获取模拟桥接服务地址失败");
        let shared = Arc::new(Shared::default());

        let handler_shared = shared.clone();
        let server = tokio::spawn(async move {
            let on_connect = move |ws: WsStream, _peer: SocketAddr| {
                let shared = handler_shared.clone();
                async move { serve_connection(shared, ws).await }
            };
            if let Err(e) = ServerTransport::serve(listener, on_connect).await {
                log::error!("[模拟桥接服务] 服务退出: {}", e);
            }
        });

        Self { addr, shared, server }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// 接下来的 `n` 条连接在握手完成后立即被关闭。
    pub fn drop_next_connections(&self, n: usize) {
        self.shared.drop_next.store(n, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        self.shared.log.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    /// 每条连接建立的时间。
    pub fn connection_times(&self) -> Vec<Instant> {
        self.shared
            .log
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, e)| matches!(e, BridgeEvent::Connected(_)))
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connection_times().len()
    }

    pub fn live_connections(&self) -> usize {
        self.shared.outbound.lock().unwrap().len()
    }

    /// 收到的全部操作（不区分连接）。
    pub fn ops(&self) -> Vec<BridgeOp> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BridgeEvent::Op(_, op) => Some(op),
                _ => None,
            })
            .collect()
    }

    /// 指定话题收到的订阅操作次数。
    pub fn subscribe_count(&self, topic: &str) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, BridgeOp::Subscribe { topic: t, .. } if t == topic))
            .count()
    }

    pub fn unsubscribe_count(&self, topic: &str) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, BridgeOp::Unsubscribe { topic: t, .. } if t == topic))
            .count()
    }

    fn broadcast(&self, message: Message) -> usize {
        let outbound = self.shared.outbound.lock().unwrap();
        outbound.values().filter(|tx| tx.send(message.clone()).is_ok()).count()
    }

    /// 向全部在线连接推送一条文本帧，返回送达的连接数。
    pub fn send_text(&self, text: impl Into<String>) -> usize {
        self.broadcast(Message::Text(text.into()))
    }

    /// 以 `{"op":"publish","topic":..,"msg":..}` 推送话题消息。
    pub fn publish(&self, topic: &str, msg: Value) -> usize {
        let text = BridgeOp::publish(topic, msg).to_json().expect("序列化发布操作失败");
        self.send_text(text)
    }

    pub fn send_binary(&self, bytes: Vec<u8>) -> usize {
        self.broadcast(Message::Binary(bytes))
    }

    /// 关闭全部在线连接。
    pub fn close_all(&self) -> usize {
        self.broadcast(Message::Close(None))
    }
}

impl Drop for MockBridge {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve_connection(shared: Arc<Shared>, mut ws: WsStream) {
    let id = shared.next_id.fetch_add(1, Ordering::SeqCst);
    shared.record(BridgeEvent::Connected(id));

    let dropped = shared
        .drop_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if dropped {
        let _ = ws.close(None).await;
        shared.record(BridgeEvent::Disconnected(id));
        return;
    }

    let (mut ws_sender, mut ws_receiver) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    shared.outbound.lock().unwrap().insert(id, tx);

    loop {
        tokio::select! {
            incoming = receive_op(&mut ws_receiver) => match incoming {
                Some(Ok(op)) => shared.record(BridgeEvent::Op(id, op)),
                _ => break,
            },
            outgoing = rx.recv() => match outgoing {
                Some(message) => {
                    let closing = matches!(message, Message::Close(_));
                    if ws_sender.send(message).await.is_err() || closing {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    shared.outbound.lock().unwrap().remove(&id);
    shared.record(BridgeEvent::Disconnected(id));
}

/// 轮询直到条件成立；超过 `WAIT_LIMIT` 时 panic 并带上描述。
pub async fn wait_until<F>(description: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + WAIT_LIMIT;
    while !condition() {
        if Instant::now() > deadline {
            panic!("等待超时: {}", description);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// 异步条件版本的 `wait_until`。
pub async fn wait_until_async<F, Fut>(description: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + WAIT_LIMIT;
    while !condition().await {
        if Instant::now() > deadline {
            panic!("等待超时: {}", description);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
