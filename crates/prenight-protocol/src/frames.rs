use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{
    DocumentHello, PanelsUpdate, RootPayload, RootRemoved, SliderSetParams, Tick,
};
use crate::methods::{PING, SLIDER_SET};

/// Anything a browser sends on a plot session. Only requests are acted on.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Wire: `{ "type": "req", "id": "7", "method": "slider.set", "params": {"value": 60221.2} }`
    Req(Request),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// A request resolved to the session method it invokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Ping,
    SliderSet(SliderSetParams),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("bad params for {method}: {reason}")]
    BadParams { method: String, reason: String },
}

impl Request {
    pub fn call(&self) -> Result<Call, CallError> {
        match self.method.as_str() {
            PING => Ok(Call::Ping),
            SLIDER_SET => {
                let params = self.params.clone().unwrap_or(Value::Null);
                serde_json::from_value(params)
                    .map(Call::SliderSet)
                    .map_err(|e| CallError::BadParams {
                        method: SLIDER_SET.to_string(),
                        reason: e.to_string(),
                    })
            }
            other => Err(CallError::UnknownMethod(other.to_string())),
        }
    }
}

/// Discriminator of server frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Res,
    Event,
}

/// Successful answers, one shape per method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Pong { ts: i64 },
    Panels(PanelsUpdate),
}

/// Server → Client response to a request.
/// Wire: `{ "type": "res", "id": "7", "ok": true, "payload": {...} }`
#[derive(Debug, Clone, Serialize)]
pub struct ResFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Reply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

impl ResFrame {
    pub fn ok(id: impl Into<String>, reply: Reply) -> Self {
        Self {
            kind: FrameKind::Res,
            id: id.into(),
            ok: true,
            payload: Some(reply),
            error: None,
        }
    }

    pub fn err(id: impl Into<String>, code: &str, message: &str) -> Self {
        Self {
            kind: FrameKind::Res,
            id: id.into(),
            ok: false,
            payload: None,
            error: Some(ErrorShape {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
}

/// What happened to a session's document. Serializes as the `event` name
/// and its `payload`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum SessionEvent {
    #[serde(rename = "document.hello")]
    Hello(DocumentHello),
    #[serde(rename = "root.add")]
    RootAdd(RootPayload),
    #[serde(rename = "root.remove")]
    RootRemove(RootRemoved),
    #[serde(rename = "tick")]
    Tick(Tick),
}

/// Server → Client session event.
/// Wire: `{ "type": "event", "event": "root.add", "payload": {...}, "seq": 3 }`
#[derive(Debug, Clone, Serialize)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    #[serde(flatten)]
    pub event: SessionEvent,
    pub seq: u64,
}

impl EventFrame {
    pub fn new(event: SessionEvent, seq: u64) -> Self {
        Self {
            kind: FrameKind::Event,
            event,
            seq,
        }
    }
}
