//! Room loading and message delivery.
//!
//! SYSTEM CONTEXT
//! ==============
//! Opening a room starts three things at once: the metadata fetch, the
//! history fetch, and the realtime connection. All of them report back into
//! `RoomState` under the epoch returned by `RoomState::open`.
//!
//! DESIGN
//! ======
//! With `SendPath::Rest` the REST create call is the source of truth: its
//! success confirms the optimistic entry and the realtime echo only marks it
//! echoed. With `SendPath::Realtime` the entry stays pending until the echo
//! arrives or the send timeout fails it.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

#[cfg(feature = "hydrate")]
use std::rc::Rc;

#[cfg(feature = "hydrate")]
use leptos::prelude::*;

use crate::config::SendPath;
#[cfg(feature = "hydrate")]
use crate::context::ChatContext;
use crate::error::ClientError;
use crate::net::api::ChatApi;
#[cfg(feature = "hydrate")]
use crate::net::realtime::RealtimeHandle;
use crate::net::realtime::MessageChannel;
use crate::net::types::{ChatSummary, NewMessage, WireMessage};
use crate::state::room::{OutgoingMessage, RoomState};
use crate::state::session::SessionState;

/// How far a successful delivery got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Stored by the backend; the entry is confirmed.
    Persisted,
    /// Emitted on the socket; confirmation waits for the echo.
    Emitted,
}

/// Fetch metadata and history concurrently.
pub async fn load_room(
    api: &impl ChatApi,
    state: &SessionState,
    chat_id: &str,
) -> (Result<ChatSummary, ClientError>, Result<Vec<WireMessage>, ClientError>) {
    let session = match state.require() {
        Ok(session) => session,
        Err(e) => return (Err(e.clone().into()), Err(e.into())),
    };
    let (metadata, history) = futures::join!(api.chat(session, chat_id), api.messages(session, chat_id));
    (metadata.map_err(ClientError::from), history.map_err(ClientError::from))
}

/// Deliver one optimistic message over the configured path.
///
/// # Errors
///
/// `Network` for REST failures (including a signed-out session) and
/// `Channel` when the socket is not connected.
pub async fn deliver(
    api: &impl ChatApi,
    channel: &impl MessageChannel,
    state: &SessionState,
    path: SendPath,
    outgoing: &OutgoingMessage,
) -> Result<DeliveryOutcome, ClientError> {
    let session = state.require()?;
    match path {
        SendPath::Rest => {
            let message = NewMessage { content: outgoing.text.clone(), client_id: outgoing.client_id.clone() };
            api.create_message(session, &outgoing.chat_id, &message).await?;
            Ok(DeliveryOutcome::Persisted)
        }
        SendPath::Realtime => {
            channel.send_message(&outgoing.chat_id, &outgoing.text)?;
            Ok(DeliveryOutcome::Emitted)
        }
    }
}

/// Fold a delivery result into the room it was started in.
pub fn apply_delivery(
    room: &mut RoomState,
    epoch: u64,
    client_id: &str,
    result: &Result<DeliveryOutcome, ClientError>,
) -> bool {
    match result {
        Ok(DeliveryOutcome::Persisted) => room.mark_confirmed(epoch, client_id),
        Ok(DeliveryOutcome::Emitted) => false,
        Err(e) => {
            log::warn!("message {client_id} not delivered: {e}");
            room.mark_failed(epoch, client_id)
        }
    }
}

#[cfg(feature = "hydrate")]
const PENDING_SWEEP_INTERVAL_MS: u64 = 1000;

/// The open room: owns its realtime connection and closes the room when
/// dropped.
#[cfg(feature = "hydrate")]
pub struct RoomSession {
    ctx: ChatContext,
    epoch: u64,
    chat_id: String,
    channel: Rc<RealtimeHandle>,
}

#[cfg(feature = "hydrate")]
impl RoomSession {
    /// Open `chat_id`, replacing whatever room was open.
    ///
    /// # Errors
    ///
    /// `Network(Unauthenticated)` when signed out; nothing is opened.
    pub fn open(ctx: ChatContext, chat_id: &str) -> Result<Self, ClientError> {
        let state = ctx.session.get_untracked();
        let session = state.require()?.clone();
        let config = ctx.config.get_value();
        let room = ctx.room;
        let epoch = room.try_update(|r| r.open(chat_id)).unwrap_or_default();

        let channel = Rc::new(RealtimeHandle::connect(&config, &session));
        channel.on_status(move |status| {
            let _ = room.try_update(|r| r.set_connection_status(epoch, status));
        });
        let self_id = session.user_id.clone();
        channel.on_message(move |message| {
            let _ = room.try_update(|r| r.apply_live(epoch, message, &self_id));
        });
        match channel.join_room(chat_id) {
            Ok(()) => {}
            Err(crate::error::ChannelError::NotConnected) => log::debug!("joinRoom {chat_id} deferred until connected"),
            Err(e) => log::warn!("joinRoom {chat_id} failed: {e}"),
        }

        let api = crate::net::api::HttpChatApi::new(&config);
        let target = chat_id.to_owned();
        let self_id = session.user_id.clone();
        leptos::task::spawn_local(async move {
            let (metadata, history) = load_room(&api, &state, &target).await;
            let _ = room.try_update(|r| {
                r.apply_metadata(epoch, metadata);
                r.apply_history(epoch, history, &self_id);
            });
        });
        spawn_pending_sweep(room, epoch, config.send_timeout_ms);

        Ok(Self { ctx, epoch, chat_id: chat_id.to_owned(), channel })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Append `text` optimistically and deliver it. Returns `false` when
    /// nothing was sent (blank text, or the room can't send).
    pub fn send(&self, text: &str) -> bool {
        let client_id = crate::state::room::new_client_id();
        let now = crate::util::clock::now_ms();
        let outgoing = self.ctx.room.try_update(|r| r.begin_send(text, &client_id, now)).flatten();
        outgoing.map(|o| self.spawn_delivery(o)).is_some()
    }

    /// Re-deliver a failed message.
    pub fn retry(&self, client_id: &str) -> bool {
        let now = crate::util::clock::now_ms();
        let outgoing = self.ctx.room.try_update(|r| r.retry(client_id, now)).flatten();
        outgoing.map(|o| self.spawn_delivery(o)).is_some()
    }

    fn spawn_delivery(&self, outgoing: OutgoingMessage) {
        let room = self.ctx.room;
        let epoch = self.epoch;
        let channel = Rc::clone(&self.channel);
        let state = self.ctx.session.get_untracked();
        let config = self.ctx.config.get_value();
        leptos::task::spawn_local(async move {
            let api = crate::net::api::HttpChatApi::new(&config);
            let result = deliver(&api, channel.as_ref(), &state, config.send_path, &outgoing).await;
            let _ = room.try_update(|r| apply_delivery(r, epoch, &outgoing.client_id, &result));
        });
    }
}

#[cfg(feature = "hydrate")]
impl Drop for RoomSession {
    fn drop(&mut self) {
        self.channel.disconnect();
        let epoch = self.epoch;
        let _ = self.ctx.room.try_update(|r| {
            if r.is_current(epoch) {
                r.close();
            }
        });
    }
}

/// Fail pending sends that outlive the timeout, until the room changes.
#[cfg(feature = "hydrate")]
fn spawn_pending_sweep(room: RwSignal<RoomState>, epoch: u64, timeout_ms: u32) {
    leptos::task::spawn_local(async move {
        loop {
            gloo_timers::future::sleep(std::time::Duration::from_millis(PENDING_SWEEP_INTERVAL_MS)).await;
            let Some((current, pending)) = room.try_with_untracked(|r| (r.is_current(epoch), r.has_pending())) else {
                break;
            };
            if !current {
                break;
            }
            if pending {
                let now = crate::util::clock::now_ms();
                let _ = room.try_update(|r| r.expire_pending(now, timeout_ms));
            }
        }
    });
}
