// rust_websocket_utils/src/server/transport.rs

//! 包含服务端 WebSocket 监听、接受连接和通信逻辑。
//!
//! 仪表盘本身只是客户端；服务端传输层供模拟桥接服务 (`bridge_sim`) 和集成测试使用。

use crate::error::WsError;
use crate::frame::next_text_frame;
use crate::message::BridgeOp;
use futures_util::stream::SplitStream;
use log::{error, info, warn};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{WebSocketStream, accept_async};

/// `WsStream` 是一个类型别名，代表经过 WebSocket 握手后的 TCP 流。
pub type WsStream = WebSocketStream<TcpStream>;

/// `ServerTransport` 结构体负责处理 WebSocket 服务端的监听和连接接受。
pub struct ServerTransport;

impl ServerTransport {
    /// 绑定指定地址并启动 WebSocket 服务器。
    ///
    /// 对于每一个成功建立的 WebSocket 连接，都会在新的 Tokio 任务中调用 `on_connect`。
    /// 只有在 TCP 监听器绑定失败时才会返回错误；否则此函数将无限期运行。
    pub async fn start<F, Fut>(addr: SocketAddr, on_connect: F) -> Result<(), WsError>
    where
        F: Fn(WsStream, SocketAddr) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        Self::serve(listener, on_connect).await
    }

    /// 在一个已经绑定好的监听器上运行接受循环。
    ///
    /// 测试中通常先绑定 `127.0.0.1:0` 取得实际端口，再把监听器交给此函数。
    pub async fn serve<F, Fut>(listener: TcpListener, on_connect: F) -> Result<(), WsError>
    where
        F: Fn(WsStream, SocketAddr) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        info!("WebSocket 服务器正在监听地址: {}", listener.local_addr()?);

        loop {
            match listener.accept().await {
                Ok((tcp_stream, peer_addr)) => {
                    info!("从 {} 接受了新的 TCP 连接", peer_addr);
                    let on_connect_callback = on_connect.clone();

                    tokio::spawn(async move {
                        match accept_async(tcp_stream).await {
                            Ok(ws_stream) => {
                                info!("与 {} 的 WebSocket 握手成功", peer_addr);
                                on_connect_callback(ws_stream, peer_addr).await;
                            }
                            Err(e) => {
                                error!("与 {} 的 WebSocket 握手失败: {}", peer_addr, e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("接受 TCP 连接失败: {}。服务器将继续运行。", e);
                }
            }
        }
    }
}

/// 从服务端接收流中读取下一条客户端操作。
///
/// 无法解析的文本帧与二进制帧会被记录并跳过；连接关闭时返回 `None`。
pub async fn receive_op(ws_receiver: &mut SplitStream<WsStream>) -> Option<Result<BridgeOp, WsError>> {
    loop {
        match next_text_frame(ws_receiver).await? {
            Ok(text) => match BridgeOp::from_text(&text) {
                Ok(op) => break Some(Ok(op)),
                Err(e) => warn!("服务端：忽略无法解析的客户端帧: {}", e),
            },
            Err(e) if e.is_fatal() => break Some(Err(e)),
            Err(e) => warn!("服务端：忽略非文本帧: {}", e),
        }
    }
}
