// rust_websocket_utils/src/frame.rs

//! 客户端与服务端共用的帧收发辅助函数。

use crate::error::WsError;
use crate::message::BridgeOp;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, error};
use tokio_tungstenite::tungstenite::{Error as TungsteniteError, protocol::Message};

/// 将一条桥接操作序列化后作为文本帧发送。
pub async fn send_op<S>(sink: &mut S, op: &BridgeOp) -> Result<(), WsError>
where
    S: Sink<Message, Error = TungsteniteError> + Unpin,
{
    let text = op.to_json()?;
    debug!("准备发送桥接操作: {}", text);
    sink.send(Message::Text(text)).await?;
    Ok(())
}

/// 从接收流中读取下一条文本帧。
///
/// Ping/Pong 以及原始 Frame 会被跳过（由底层库自动应答）。
///
/// # Returns
/// - `Some(Ok(text))`：收到一条文本帧。
/// - `Some(Err(WsError::Message(_)))`：收到二进制帧，调用方应丢弃它并继续读取。
/// - `Some(Err(WsError::WebSocketProtocolError(_)))`：底层错误，连接已不可用。
/// - `None`：收到 Close 帧或流已结束。
pub async fn next_text_frame<S>(stream: &mut S) -> Option<Result<String, WsError>>
where
    S: Stream<Item = Result<Message, TungsteniteError>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!("收到文本帧: '{}'", text);
                break Some(Ok(text));
            }
            Some(Ok(Message::Binary(bin))) => {
                debug!("收到二进制帧，长度: {} 字节", bin.len());
                break Some(Err(WsError::Message(format!(
                    "收到了非预期的二进制帧 ({} 字节)",
                    bin.len()
                ))));
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {
                // 控制帧，继续等待下一条业务帧
            }
            Some(Ok(Message::Close(close_frame))) => {
                debug!("收到 Close 帧: {:?}", close_frame);
                break None;
            }
            Some(Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed)) => {
                debug!("连接已关闭 (ConnectionClosed/AlreadyClosed)。");
                break None;
            }
            Some(Err(e)) => {
                error!("从 WebSocket 流接收帧时发生底层错误: {}", e);
                break Some(Err(WsError::WebSocketProtocolError(e)));
            }
            None => {
                debug!("WebSocket 接收流已结束。");
                break None;
            }
        }
    }
}
