//! State for the open conversation room.
//!
//! SYSTEM CONTEXT
//! ==============
//! One room is open at a time. Opening it bumps [`RoomState::epoch`]; every
//! async completion (metadata, history, realtime event, delivery result)
//! carries the epoch it was started under and is dropped if the room has
//! since been switched or closed.
//!
//! DESIGN
//! ======
//! The transcript is the fetched history followed by live entries in receipt
//! order. Live entries that arrive before history completes stay after it.
//! Own sends are appended as `Pending` immediately and reconciled against the
//! realtime echo by correlation id, falling back to matching text for entries
//! still pending.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use crate::error::ClientError;
use crate::net::realtime::{ConnectionStatus, classify};
use crate::net::types::{ChatSummary, WireMessage};

pub const PLACEHOLDER_TITLE: &str = "Conversation";
pub const HISTORY_FAILED_NOTICE: &str = "Could not load earlier messages.";
pub const RECONNECTING_NOTICE: &str = "Connection lost. Reconnecting...";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoomPhase {
    /// Metadata and history requested.
    Loading,
    /// History applied (or failed); transcript is interactive.
    Ready,
    #[default]
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One rendered message.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptEntry {
    /// Correlation id for messages sent from this client.
    pub client_id: Option<String>,
    pub text: String,
    pub file_url: Option<String>,
    pub sender_id: Option<String>,
    pub direction: Direction,
    pub sent_at: Option<String>,
    pub status: DeliveryStatus,
    /// When the current delivery attempt started.
    pub queued_at_ms: Option<f64>,
    /// Whether the realtime echo for this optimistic entry has arrived.
    pub echoed: bool,
}

impl TranscriptEntry {
    pub fn from_wire(message: WireMessage, self_id: &str) -> Self {
        Self {
            direction: classify(message.sender_id.as_deref(), self_id),
            client_id: message.client_id,
            text: message.text,
            file_url: message.file_url,
            sender_id: message.sender_id,
            sent_at: message.sent_at,
            status: DeliveryStatus::Confirmed,
            queued_at_ms: None,
            echoed: true,
        }
    }

    fn is_own_unechoed(&self) -> bool {
        self.direction == Direction::Outgoing && self.client_id.is_some() && !self.echoed
    }
}

/// Fresh correlation id for an outgoing message (UUID v4).
pub fn new_client_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A delivery the send flow must perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub client_id: String,
    pub chat_id: String,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoomState {
    pub epoch: u64,
    pub chat_id: Option<String>,
    pub phase: RoomPhase,
    pub title: Option<String>,
    pub avatar: Option<String>,
    pub history: Vec<TranscriptEntry>,
    pub live: Vec<TranscriptEntry>,
    pub history_error: Option<String>,
    pub connection_status: ConnectionStatus,
}

impl RoomState {
    /// Switch to `chat_id`, discarding everything from the previous room.
    pub fn open(&mut self, chat_id: &str) -> u64 {
        let epoch = self.epoch + 1;
        *self = Self { epoch, chat_id: Some(chat_id.to_owned()), phase: RoomPhase::Loading, ..Self::default() };
        log::debug!("room {chat_id} opened epoch={epoch}");
        epoch
    }

    pub fn close(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self { epoch, ..Self::default() };
    }

    /// Whether a completion started under `epoch` still applies.
    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch && self.phase != RoomPhase::Closed
    }

    pub fn apply_metadata(&mut self, epoch: u64, result: Result<ChatSummary, ClientError>) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        match result {
            Ok(chat) => {
                self.title = Some(chat.name);
                self.avatar = chat.avatar;
            }
            Err(e) => {
                log::warn!("room metadata failed: {e}");
                self.title = Some(PLACEHOLDER_TITLE.to_owned());
            }
        }
        true
    }

    /// Apply fetched history and move to `Ready`, on success or failure.
    pub fn apply_history(
        &mut self,
        epoch: u64,
        result: Result<Vec<WireMessage>, ClientError>,
        self_id: &str,
    ) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        match result {
            Ok(messages) => {
                self.history = messages.into_iter().map(|m| TranscriptEntry::from_wire(m, self_id)).collect();
                self.history_error = None;
            }
            Err(e) => {
                log::warn!("room history failed: {e}");
                self.history.clear();
                self.history_error = Some(HISTORY_FAILED_NOTICE.to_owned());
            }
        }
        self.phase = RoomPhase::Ready;
        true
    }

    pub fn set_connection_status(&mut self, epoch: u64, status: ConnectionStatus) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        self.connection_status = status;
        true
    }

    /// Apply a realtime `newMessage`. An echo of an optimistic entry confirms
    /// it in place; anything else is appended.
    pub fn apply_live(&mut self, epoch: u64, message: WireMessage, self_id: &str) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        let entry = TranscriptEntry::from_wire(message, self_id);
        if entry.direction == Direction::Outgoing
            && let Some(index) = self.find_echo_target(&entry)
        {
            let target = &mut self.live[index];
            target.echoed = true;
            target.status = DeliveryStatus::Confirmed;
            if entry.sent_at.is_some() {
                target.sent_at = entry.sent_at;
            }
            if entry.file_url.is_some() {
                target.file_url = entry.file_url;
            }
            return true;
        }
        self.live.push(entry);
        true
    }

    /// An echo carrying a correlation id matches only its own entry. Without
    /// one, fall back to the oldest still-pending entry with the same text;
    /// confirmed entries are never matched by text.
    fn find_echo_target(&self, echo: &TranscriptEntry) -> Option<usize> {
        if let Some(client_id) = echo.client_id.as_deref() {
            return self
                .live
                .iter()
                .position(|e| e.is_own_unechoed() && e.client_id.as_deref() == Some(client_id));
        }
        self.live
            .iter()
            .position(|e| e.is_own_unechoed() && e.status == DeliveryStatus::Pending && e.text == echo.text)
    }

    pub fn can_send(&self) -> bool {
        self.phase == RoomPhase::Ready && self.connection_status == ConnectionStatus::Connected
    }

    /// Append an optimistic outgoing entry. Whitespace-only text, or a room
    /// that can't send, is a no-op.
    pub fn begin_send(&mut self, text: &str, client_id: &str, now_ms: f64) -> Option<OutgoingMessage> {
        let text = text.trim();
        if text.is_empty() || !self.can_send() {
            return None;
        }
        let chat_id = self.chat_id.clone()?;
        self.live.push(TranscriptEntry {
            client_id: Some(client_id.to_owned()),
            text: text.to_owned(),
            file_url: None,
            sender_id: None,
            direction: Direction::Outgoing,
            sent_at: None,
            status: DeliveryStatus::Pending,
            queued_at_ms: Some(now_ms),
            echoed: false,
        });
        Some(OutgoingMessage { client_id: client_id.to_owned(), chat_id, text: text.to_owned() })
    }

    fn own_entry_mut(&mut self, client_id: &str) -> Option<&mut TranscriptEntry> {
        self.live.iter_mut().find(|e| e.client_id.as_deref() == Some(client_id))
    }

    pub fn mark_confirmed(&mut self, epoch: u64, client_id: &str) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        match self.own_entry_mut(client_id) {
            Some(entry) if entry.status != DeliveryStatus::Confirmed => {
                entry.status = DeliveryStatus::Confirmed;
                true
            }
            _ => false,
        }
    }

    /// Pending -> Failed. A confirmed entry stays confirmed.
    pub fn mark_failed(&mut self, epoch: u64, client_id: &str) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        match self.own_entry_mut(client_id) {
            Some(entry) if entry.status == DeliveryStatus::Pending => {
                entry.status = DeliveryStatus::Failed;
                true
            }
            _ => false,
        }
    }

    /// Put a failed entry back to `Pending` and return the delivery to redo.
    pub fn retry(&mut self, client_id: &str, now_ms: f64) -> Option<OutgoingMessage> {
        if !self.can_send() {
            return None;
        }
        let chat_id = self.chat_id.clone()?;
        let entry = self.own_entry_mut(client_id)?;
        if entry.status != DeliveryStatus::Failed {
            return None;
        }
        entry.status = DeliveryStatus::Pending;
        entry.queued_at_ms = Some(now_ms);
        Some(OutgoingMessage { client_id: client_id.to_owned(), chat_id, text: entry.text.clone() })
    }

    pub fn has_pending(&self) -> bool {
        self.live.iter().any(|e| e.status == DeliveryStatus::Pending)
    }

    /// Fail pending entries queued more than `timeout_ms` ago. Returns their
    /// correlation ids.
    pub fn expire_pending(&mut self, now_ms: f64, timeout_ms: u32) -> Vec<String> {
        let mut expired = Vec::new();
        for entry in &mut self.live {
            if entry.status != DeliveryStatus::Pending {
                continue;
            }
            let queued = entry.queued_at_ms.unwrap_or(now_ms);
            if now_ms - queued >= f64::from(timeout_ms) {
                entry.status = DeliveryStatus::Failed;
                expired.extend(entry.client_id.clone());
            }
        }
        expired
    }

    /// History followed by live entries.
    pub fn transcript(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.history.iter().chain(self.live.iter())
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(PLACEHOLDER_TITLE)
    }

    /// Inline notice for the room, history problems first.
    pub fn notice(&self) -> Option<&str> {
        if self.phase == RoomPhase::Closed {
            return None;
        }
        if let Some(error) = self.history_error.as_deref() {
            return Some(error);
        }
        match self.connection_status {
            ConnectionStatus::Failed => Some(crate::error::CHANNEL_UNAVAILABLE_MESSAGE),
            ConnectionStatus::Disconnected if self.phase == RoomPhase::Ready => Some(RECONNECTING_NOTICE),
            _ => None,
        }
    }
}
