//! Realtime channel: one Socket.IO connection scoped to an open room.
//!
//! The protocol logic lives in [`ChannelState`], which consumes websocket text
//! frames and returns [`ChannelAction`]s without doing any IO. The browser
//! driver in `realtime_socket.rs` (`hydrate` only) owns the websocket, runs the
//! reconnect loop, and executes those actions.
//!
//! DESIGN
//! ======
//! - `joinRoom` before the Socket.IO CONNECT ack fails with `NotConnected`, but
//!   the room is remembered and joined as soon as the connection is
//!   established, and again after every reconnect.
//! - Reconnects back off exponentially (see [`Backoff`]); a CONNECT_ERROR from
//!   the server is terminal.
//! - After [`ChannelState::close`] nothing is delivered and nothing is sent.

#[cfg(test)]
#[path = "realtime_test.rs"]
mod realtime_test;

#[cfg(feature = "hydrate")]
#[path = "realtime_socket.rs"]
mod realtime_socket;
#[cfg(feature = "hydrate")]
pub use self::realtime_socket::RealtimeHandle;

use serde_json::Value;

use crate::config::ReconnectPolicy;
use crate::error::ChannelError;
use crate::net::socket_codec::{
    CodecError, DEFAULT_NAMESPACE, EnginePacket, SocketPacket, decode_engine_packet, decode_socket_packet,
    encode_engine_packet, encode_message,
};
use crate::net::types::WireMessage;
use crate::state::room::Direction;

pub const JOIN_ROOM_EVENT: &str = "joinRoom";
pub const SEND_MESSAGE_EVENT: &str = "sendMessage";
pub const NEW_MESSAGE_EVENT: &str = "newMessage";

/// Connection lifecycle as seen by the room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected; socket is closed or waiting to reconnect.
    #[default]
    Disconnected,
    /// Websocket or Socket.IO handshake in progress.
    Connecting,
    /// Socket.IO CONNECT acknowledged.
    Connected,
    /// Rejected by the server or out of reconnect attempts. Terminal.
    Failed,
}

/// Side effect requested by [`ChannelState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelAction {
    /// Write this text frame to the websocket.
    Send(String),
    /// Hand a `newMessage` payload to listeners.
    Deliver(WireMessage),
    /// Notify listeners of a status change.
    Status(ConnectionStatus),
    /// The server refused the connection with this reason.
    Rejected(String),
}

/// Outbound half of the channel as seen by the send flow.
pub trait MessageChannel {
    fn status(&self) -> ConnectionStatus;

    /// Emit `sendMessage(chat_id, text)`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotConnected`] before the handshake completes
    /// and [`ChannelError::Closed`] after disconnect.
    fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChannelError>;
}

/// Classify an inbound message by comparing its sender with the session user.
///
/// Any direction flag the server might attach is ignored.
pub fn classify(sender_id: Option<&str>, self_id: &str) -> Direction {
    if sender_id.is_some_and(|id| id == self_id) { Direction::Outgoing } else { Direction::Incoming }
}

/// Websocket URL for the Engine.IO v4 websocket transport.
///
/// Browsers can't attach custom headers to a websocket, so the token rides
/// in the `authentication` query parameter (and in the CONNECT payload).
pub fn socket_endpoint(base_url: &str, encoded_token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{ws_base}/socket.io/?EIO=4&transport=websocket&authentication={encoded_token}")
}

fn join_packet(chat_id: &str) -> String {
    encode_message(&SocketPacket::event(JOIN_ROOM_EVENT, vec![Value::String(chat_id.to_owned())]))
}

fn send_packet(chat_id: &str, text: &str) -> String {
    encode_message(&SocketPacket::event(
        SEND_MESSAGE_EVENT,
        vec![Value::String(chat_id.to_owned()), Value::String(text.to_owned())],
    ))
}

/// Sans-IO protocol state for one realtime connection.
#[derive(Debug)]
pub struct ChannelState {
    token: String,
    status: ConnectionStatus,
    room: Option<String>,
    established: bool,
    closed: bool,
}

impl ChannelState {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_owned(),
            status: ConnectionStatus::Disconnected,
            room: None,
            established: false,
            closed: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Room requested by the last `join_room`, joined or pending.
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Request `joinRoom(chat_id)`.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotConnected`] before the CONNECT ack (the room is
    /// still recorded and joined once connected); [`ChannelError::Closed`]
    /// after [`close`](Self::close).
    pub fn join_room(&mut self, chat_id: &str) -> Result<String, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.room = Some(chat_id.to_owned());
        if self.status != ConnectionStatus::Connected {
            return Err(ChannelError::NotConnected);
        }
        Ok(join_packet(chat_id))
    }

    /// Build the `sendMessage` frame.
    ///
    /// # Errors
    ///
    /// Same conditions as [`join_room`](Self::join_room), without recording
    /// anything.
    pub fn send_message(&self, chat_id: &str, text: &str) -> Result<String, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        if self.status != ConnectionStatus::Connected {
            return Err(ChannelError::NotConnected);
        }
        Ok(send_packet(chat_id, text))
    }

    /// The driver is opening a new websocket.
    pub fn on_transport_opening(&mut self) -> Vec<ChannelAction> {
        if self.closed || self.status == ConnectionStatus::Failed {
            return Vec::new();
        }
        self.set_status(ConnectionStatus::Connecting)
    }

    /// The websocket dropped.
    pub fn on_transport_closed(&mut self) -> Vec<ChannelAction> {
        if self.closed || self.status == ConnectionStatus::Failed {
            return Vec::new();
        }
        self.set_status(ConnectionStatus::Disconnected)
    }

    /// Reconnect attempts are exhausted.
    pub fn mark_failed(&mut self) -> Vec<ChannelAction> {
        if self.closed {
            return Vec::new();
        }
        self.set_status(ConnectionStatus::Failed)
    }

    /// Whether a CONNECT ack arrived since the last call; clears the flag.
    pub fn take_established(&mut self) -> bool {
        std::mem::take(&mut self.established)
    }

    /// Process one inbound websocket text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the frame can't be decoded. The channel
    /// stays usable; the frame is simply dropped by the driver.
    pub fn handle_incoming(&mut self, raw: &str) -> Result<Vec<ChannelAction>, CodecError> {
        if self.closed {
            return Ok(Vec::new());
        }
        let actions = match decode_engine_packet(raw)? {
            EnginePacket::Open(handshake) => {
                log::debug!("engine.io open sid={} ping_interval={}", handshake.sid, handshake.ping_interval);
                let auth = serde_json::json!({ "authentication": self.token });
                vec![ChannelAction::Send(encode_message(&SocketPacket::connect(Some(auth))))]
            }
            EnginePacket::Ping(data) => vec![ChannelAction::Send(encode_engine_packet(&EnginePacket::Pong(data)))],
            EnginePacket::Close => self.set_status(ConnectionStatus::Disconnected),
            EnginePacket::Message(payload) => self.handle_socket_packet(decode_socket_packet(&payload)?),
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Vec::new(),
        };
        Ok(actions)
    }

    fn handle_socket_packet(&mut self, packet: SocketPacket) -> Vec<ChannelAction> {
        match packet {
            SocketPacket::Connect { namespace, .. } if namespace == DEFAULT_NAMESPACE => {
                self.established = true;
                let mut actions = self.set_status(ConnectionStatus::Connected);
                if let Some(room) = &self.room {
                    actions.push(ChannelAction::Send(join_packet(room)));
                }
                actions
            }
            SocketPacket::ConnectError { message, .. } => {
                let mut actions = self.set_status(ConnectionStatus::Failed);
                actions.push(ChannelAction::Rejected(message));
                actions
            }
            SocketPacket::Disconnect { namespace } if namespace == DEFAULT_NAMESPACE => {
                self.set_status(ConnectionStatus::Disconnected)
            }
            SocketPacket::Event { name, args, .. } if name == NEW_MESSAGE_EVENT => {
                match args.into_iter().next().map(serde_json::from_value::<WireMessage>) {
                    Some(Ok(message)) => vec![ChannelAction::Deliver(message)],
                    Some(Err(e)) => {
                        log::warn!("dropping malformed {NEW_MESSAGE_EVENT} payload: {e}");
                        Vec::new()
                    }
                    None => Vec::new(),
                }
            }
            other => {
                log::debug!("ignoring socket.io packet {other:?}");
                Vec::new()
            }
        }
    }

    /// Mark the channel closed. Returns `true` only on the first call.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.status = ConnectionStatus::Disconnected;
        true
    }

    fn set_status(&mut self, status: ConnectionStatus) -> Vec<ChannelAction> {
        if self.status == status {
            return Vec::new();
        }
        self.status = status;
        vec![ChannelAction::Status(status)]
    }
}

/// Exponential reconnect delays: `initial`, `2 * initial`, ... capped at `max`.
#[derive(Clone, Debug)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    /// Delay before the next attempt, or `None` when attempts are exhausted.
    pub fn next_delay_ms(&mut self) -> Option<u32> {
        if let Some(max_attempts) = self.policy.max_attempts
            && self.attempts >= max_attempts
        {
            return None;
        }
        let factor = 1_u32 << self.attempts.min(16);
        let delay = self.policy.initial_ms.saturating_mul(factor).min(self.policy.max_ms);
        self.attempts += 1;
        Some(delay)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
