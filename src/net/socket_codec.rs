//! Engine.IO v4 / Socket.IO v5 packet codec for the websocket transport.
//!
//! A websocket text message carries one Engine.IO packet: a single digit type
//! followed by its payload. Engine.IO `message` packets (`4`) carry one
//! Socket.IO packet:
//!
//! ```text
//! <type>[<namespace>,][<ack id>][<json>]
//! 42["newMessage",{"text":"hi"}]
//! 40{"authentication":"token"}
//! ```
//!
//! Binary packets (Socket.IO types 5 and 6) are not used by this backend and
//! are rejected.

#[cfg(test)]
#[path = "socket_codec_test.rs"]
mod socket_codec_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("empty packet")]
    Empty,
    #[error("unknown engine.io packet type '{0}'")]
    UnknownEngineType(char),
    #[error("unknown socket.io packet type '{0}'")]
    UnknownSocketType(char),
    #[error("binary socket.io packets are not supported")]
    BinaryUnsupported,
    #[error("malformed packet: {0}")]
    Malformed(String),
    #[error("invalid packet json: {0}")]
    Json(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Payload of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

/// Decode one Engine.IO packet from a websocket text frame.
///
/// # Errors
///
/// Returns a [`CodecError`] for empty input, unknown packet types, or an
/// `open` packet whose handshake JSON doesn't parse.
pub fn decode_engine_packet(raw: &str) -> Result<EnginePacket, CodecError> {
    let mut chars = raw.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(rest.to_owned())),
        '3' => Ok(EnginePacket::Pong(rest.to_owned())),
        '4' => Ok(EnginePacket::Message(rest.to_owned())),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(CodecError::UnknownEngineType(other)),
    }
}

/// Encode one Engine.IO packet as websocket text.
pub fn encode_engine_packet(packet: &EnginePacket) -> String {
    match packet {
        EnginePacket::Open(handshake) => {
            format!("0{}", serde_json::to_string(handshake).unwrap_or_else(|_| "{}".to_owned()))
        }
        EnginePacket::Close => "1".to_owned(),
        EnginePacket::Ping(data) => format!("2{data}"),
        EnginePacket::Pong(data) => format!("3{data}"),
        EnginePacket::Message(data) => format!("4{data}"),
        EnginePacket::Upgrade => "5".to_owned(),
        EnginePacket::Noop => "6".to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketPacket {
    Connect { namespace: String, data: Option<Value> },
    Disconnect { namespace: String },
    Event { namespace: String, ack_id: Option<u64>, name: String, args: Vec<Value> },
    Ack { namespace: String, ack_id: u64, args: Vec<Value> },
    ConnectError { namespace: String, message: String },
}

impl SocketPacket {
    /// An event on the default namespace without an ack.
    pub fn event(name: &str, args: Vec<Value>) -> Self {
        Self::Event { namespace: DEFAULT_NAMESPACE.to_owned(), ack_id: None, name: name.to_owned(), args }
    }

    /// A CONNECT request on the default namespace.
    pub fn connect(data: Option<Value>) -> Self {
        Self::Connect { namespace: DEFAULT_NAMESPACE.to_owned(), data }
    }
}

/// Decode the Socket.IO packet carried by an Engine.IO `message`.
///
/// # Errors
///
/// Returns a [`CodecError`] for unknown or binary packet types, bad JSON, or
/// an EVENT/ACK whose payload isn't the expected array.
pub fn decode_socket_packet(payload: &str) -> Result<SocketPacket, CodecError> {
    let mut chars = payload.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let mut rest = chars.as_str();

    if matches!(kind, '5' | '6') {
        return Err(CodecError::BinaryUnsupported);
    }

    let namespace = if rest.starts_with('/') {
        let end = rest.find(',').unwrap_or(rest.len());
        let ns = rest[..end].to_owned();
        rest = rest.get(end + 1..).unwrap_or("");
        ns
    } else {
        DEFAULT_NAMESPACE.to_owned()
    };

    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let ack_id = if digits_end > 0 {
        Some(
            rest[..digits_end]
                .parse::<u64>()
                .map_err(|_| CodecError::Malformed(format!("ack id out of range: {}", &rest[..digits_end])))?,
        )
    } else {
        None
    };
    rest = &rest[digits_end..];

    let data = if rest.is_empty() { None } else { Some(serde_json::from_str::<Value>(rest)?) };

    match kind {
        '0' => Ok(SocketPacket::Connect { namespace, data }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let Some(Value::Array(mut items)) = data else {
                return Err(CodecError::Malformed("event payload must be an array".to_owned()));
            };
            if items.is_empty() {
                return Err(CodecError::Malformed("event payload is empty".to_owned()));
            }
            let Value::String(name) = items.remove(0) else {
                return Err(CodecError::Malformed("event name must be a string".to_owned()));
            };
            Ok(SocketPacket::Event { namespace, ack_id, name, args: items })
        }
        '3' => {
            let ack_id = ack_id.ok_or_else(|| CodecError::Malformed("ack without id".to_owned()))?;
            let args = match data {
                Some(Value::Array(items)) => items,
                None => Vec::new(),
                Some(_) => return Err(CodecError::Malformed("ack payload must be an array".to_owned())),
            };
            Ok(SocketPacket::Ack { namespace, ack_id, args })
        }
        '4' => {
            let message = match data {
                Some(Value::String(s)) => s,
                Some(value) => value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("connection refused")
                    .to_owned(),
                None => "connection refused".to_owned(),
            };
            Ok(SocketPacket::ConnectError { namespace, message })
        }
        other => Err(CodecError::UnknownSocketType(other)),
    }
}

/// Encode a Socket.IO packet without the Engine.IO prefix.
pub fn encode_socket_packet(packet: &SocketPacket) -> String {
    let (kind, namespace, ack_id, data) = match packet {
        SocketPacket::Connect { namespace, data } => ('0', namespace, None, data.clone()),
        SocketPacket::Disconnect { namespace } => ('1', namespace, None, None),
        SocketPacket::Event { namespace, ack_id, name, args } => {
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Value::String(name.clone()));
            items.extend(args.iter().cloned());
            ('2', namespace, *ack_id, Some(Value::Array(items)))
        }
        SocketPacket::Ack { namespace, ack_id, args } => ('3', namespace, Some(*ack_id), Some(Value::Array(args.clone()))),
        SocketPacket::ConnectError { namespace, message } => {
            ('4', namespace, None, Some(serde_json::json!({ "message": message })))
        }
    };

    let mut out = String::new();
    out.push(kind);
    if namespace != DEFAULT_NAMESPACE {
        out.push_str(namespace);
        out.push(',');
    }
    if let Some(id) = ack_id {
        out.push_str(&id.to_string());
    }
    if let Some(data) = data {
        out.push_str(&data.to_string());
    }
    out
}

/// Encode a Socket.IO packet wrapped in an Engine.IO `message`, ready to send.
pub fn encode_message(packet: &SocketPacket) -> String {
    encode_engine_packet(&EnginePacket::Message(encode_socket_packet(packet)))
}
