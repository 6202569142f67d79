// rust_websocket_utils/src/message.rs

//! 定义与机器人桥接服务通信时使用的消息结构。
//!
//! 桥接服务使用 rosbridge 风格的 JSON 协议：客户端通过 `op` 字段区分操作
//! (`subscribe` / `unsubscribe` / `publish`)，服务端推送的话题数据放在 `msg` 字段中。
//! 实际部署中也会遇到省略 `op` 的 `{topic, msg}` 以及直接推送字段对象的情况，
//! 因此入站方向使用宽松的 `BridgeMessage` 信封解析，出站方向使用严格的 `BridgeOp`。

use crate::error::WsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 桥接协议中的一条操作。
///
/// 序列化形式由 `op` 字段区分，例如：
/// `{"op":"subscribe","topic":"/dash_board/BMS_status","id":"subscribe:/dash_board/BMS_status:<uuid>"}`。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeOp {
    /// 订阅一个话题。
    Subscribe {
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// 取消订阅一个话题。
    Unsubscribe {
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// 在话题上发布一条消息（服务端 → 客户端）。
    Publish { topic: String, msg: Value },
}

impl BridgeOp {
    /// 构造一条订阅操作，附带唯一的请求 ID (`subscribe:<topic>:<uuid>`)。
    pub fn subscribe(topic: &str) -> Self {
        BridgeOp::Subscribe {
            topic: topic.to_string(),
            id: Some(format!("subscribe:{}:{}", topic, Uuid::new_v4())),
        }
    }

    /// 构造一条取消订阅操作，ID 格式与订阅对称。
    pub fn unsubscribe(topic: &str) -> Self {
        BridgeOp::Unsubscribe {
            topic: topic.to_string(),
            id: Some(format!("unsubscribe:{}:{}", topic, Uuid::new_v4())),
        }
    }

    /// 构造一条发布操作。
    pub fn publish(topic: &str, msg: Value) -> Self {
        BridgeOp::Publish {
            topic: topic.to_string(),
            msg,
        }
    }

    /// 该操作针对的话题名。
    pub fn topic(&self) -> &str {
        match self {
            BridgeOp::Subscribe { topic, .. }
            | BridgeOp::Unsubscribe { topic, .. }
            | BridgeOp::Publish { topic, .. } => topic,
        }
    }

    /// 将操作序列化为 JSON 文本帧内容。
    pub fn to_json(&self) -> Result<String, WsError> {
        serde_json::to_string(self)
            .map_err(|e| WsError::SerializationError(format!("桥接操作序列化失败: {}", e)))
    }

    /// 从文本帧内容解析一条操作。
    pub fn from_text(text: &str) -> Result<Self, WsError> {
        serde_json::from_str(text).map_err(|e| {
            WsError::DeserializationError(format!("无法解析桥接操作: {}, 原始文本: '{}'", e, text))
        })
    }
}

/// 从桥接服务收到的一条入站消息。
///
/// 解析规则：
/// - 帧内容必须是合法 JSON，否则返回 `WsError::DeserializationError`；
/// - 顶层为对象且带有非空 `msg` 字段时，`payload` 取 `msg`，否则 `payload` 为整个帧；
/// - `topic` / `op` 只有在顶层对象中以字符串出现时才会被提取。
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeMessage {
    /// 帧中声明的操作类型（缺省表示未声明）。
    pub op: Option<String>,
    /// 帧所属的话题（缺省表示未声明）。
    pub topic: Option<String>,
    /// 话题数据本体。
    pub payload: Value,
}

impl BridgeMessage {
    /// 从文本帧内容解析入站消息。
    pub fn from_text(text: &str) -> Result<Self, WsError> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            WsError::DeserializationError(format!("入站帧不是合法的 JSON: {}, 原始文本: '{}'", e, text))
        })?;
        Ok(Self::from_value(value))
    }

    /// 从已解析的 JSON 值构造入站消息。
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return BridgeMessage { op: None, topic: None, payload: value };
        };
        let op = fields.get("op").and_then(Value::as_str).map(str::to_string);
        let topic = fields.get("topic").and_then(Value::as_str).map(str::to_string);
        let payload = match fields.remove("msg") {
            Some(msg) if !msg.is_null() => msg,
            Some(msg) => {
                // msg 为 null 时退回到整个帧
                fields.insert("msg".to_string(), msg);
                Value::Object(fields)
            }
            None => Value::Object(fields),
        };
        BridgeMessage { op, topic, payload }
    }

    /// 是否为携带话题数据的帧。
    ///
    /// 声明了 `op` 但不是 `publish` 的帧（例如服务端的 `status` 回执）不携带遥测数据。
    pub fn carries_data(&self) -> bool {
        match self.op.as_deref() {
            None | Some("publish") => true,
            Some(_) => false,
        }
    }
}
