// rust_websocket_utils/src/client/transport.rs

//! 客户端 WebSocket 传输层核心逻辑。
//!
//! 本模块提供连接桥接服务、发送桥接操作 (`BridgeOp`) 以及接收入站话题消息
//! (`BridgeMessage`) 的功能。连接建立后会被拆分为发送端与接收端，
//! 调用方可以把两者交给不同的任务持有。

use crate::error::WsError;
use crate::frame::{next_text_frame, send_op};
use crate::message::{BridgeMessage, BridgeOp};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, error, info};
use std::time::Duration;
use tokio_tungstenite::{WebSocketStream, connect_async, tungstenite::protocol::Message};
use url::Url;

/// `ClientWsStream` 类型别名，代表一个可能经过 TLS 加密的 TCP WebSocket 流。
pub type ClientWsStream = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// 客户端连接的发送端。
pub type ClientSink = SplitSink<ClientWsStream, Message>;

/// 客户端连接的接收端。
pub type ClientStream = SplitStream<ClientWsStream>;

/// `ClientConnection` 结构体代表一个活动的客户端 WebSocket 连接。
pub struct ClientConnection {
    /// 用于向桥接服务发送操作的发送端。
    pub ws_sender: ClientSink,
    /// 用于接收桥接服务推送的接收端。
    pub ws_receiver: ClientStream,
}

impl ClientConnection {
    /// 异步向桥接服务发送一条操作。
    pub async fn send_op(&mut self, op: &BridgeOp) -> Result<(), WsError> {
        send_op(&mut self.ws_sender, op).await
    }

    /// 拆分为独立的发送端与接收端。
    pub fn into_split(self) -> (ClientSink, ClientStream) {
        (self.ws_sender, self.ws_receiver)
    }
}

/// 解析并校验桥接服务的 URL，只接受 `ws` / `wss` 协议。
pub fn validate_url(url_str: &str) -> Result<Url, WsError> {
    let parsed_url = Url::parse(url_str)
        .map_err(|e| WsError::InvalidUrl(format!("无效的 WebSocket URL '{}': {}", url_str, e)))?;
    match parsed_url.scheme() {
        "ws" | "wss" => Ok(parsed_url),
        other => Err(WsError::InvalidUrl(format!(
            "不支持的协议 '{}'，WebSocket URL 必须以 ws:// 或 wss:// 开头: '{}'",
            other, url_str
        ))),
    }
}

/// 异步连接到指定的 WebSocket 服务器。
///
/// 如果 URL 校验失败返回 `WsError::InvalidUrl`；连接或握手失败返回
/// `WsError::WebSocketProtocolError`。
pub async fn connect_client(url_str: &str) -> Result<ClientConnection, WsError> {
    info!("客户端：开始尝试连接到 WebSocket 服务器，URL: {}", url_str);
    let parsed_url = validate_url(url_str)?;

    match connect_async(parsed_url.as_str()).await {
        Ok((ws_stream, response)) => {
            info!("客户端：已成功连接到 {} (HTTP 状态码: {})", url_str, response.status());
            debug!("客户端：WebSocket 连接响应头: {:?}", response.headers());
            let (ws_sender, ws_receiver) = ws_stream.split();
            Ok(ClientConnection { ws_sender, ws_receiver })
        }
        Err(e) => {
            error!("客户端：连接到 {} 失败，错误: {}", url_str, e);
            Err(WsError::WebSocketProtocolError(e))
        }
    }
}

/// 带超时的 [`connect_client`]。超时返回 `WsError::ConnectionTimeout`。
pub async fn connect_client_with_timeout(url_str: &str, limit: Duration) -> Result<ClientConnection, WsError> {
    match tokio::time::timeout(limit, connect_client(url_str)).await {
        Ok(result) => result,
        Err(_) => {
            error!("客户端：连接到 {} 超时 (超过 {:?})", url_str, limit);
            Err(WsError::ConnectionTimeout)
        }
    }
}

/// 从接收端读取并解析下一条入站消息。
///
/// # Returns
/// - `Some(Ok(message))`：成功解析了一条消息。
/// - `Some(Err(e))`：`e.is_fatal()` 为假时只是本帧无效（非 JSON、二进制帧），可以继续读取；
///   为真时连接已不可用。
/// - `None`：连接已关闭。
pub async fn receive_message(ws_receiver: &mut ClientStream) -> Option<Result<BridgeMessage, WsError>> {
    let frame = next_text_frame(ws_receiver).await?;
    Some(frame.and_then(|text| BridgeMessage::from_text(&text)))
}

/// 发送 Close 帧并关闭发送端。对方已断开时产生的错误会被返回给调用方记录。
pub async fn close(ws_sender: &mut ClientSink) -> Result<(), WsError> {
    ws_sender.send(Message::Close(None)).await?;
    ws_sender.close().await?;
    Ok(())
}
