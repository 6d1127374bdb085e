//! Shared reactive handles for the view layer.
//!
//! SYSTEM CONTEXT
//! ==============
//! The app root calls [`provide_chat_context`] once; components and flow
//! controllers read the same signals through [`use_chat_context`].

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use leptos::prelude::*;

use crate::config::ClientConfig;
use crate::state::chat_list::ChatListState;
use crate::state::group::GroupDraft;
use crate::state::room::RoomState;
use crate::state::session::SessionState;

#[derive(Clone, Copy)]
pub struct ChatContext {
    pub config: StoredValue<ClientConfig>,
    pub session: RwSignal<SessionState>,
    pub chat_list: RwSignal<ChatListState>,
    pub room: RwSignal<RoomState>,
    /// `Some` while the group-creation modal is open.
    pub group_draft: RwSignal<Option<GroupDraft>>,
}

impl ChatContext {
    pub fn new(config: ClientConfig, session: SessionState) -> Self {
        Self {
            config: StoredValue::new(config),
            session: RwSignal::new(session),
            chat_list: RwSignal::new(ChatListState::default()),
            room: RwSignal::new(RoomState::default()),
            group_draft: RwSignal::new(None),
        }
    }

    pub fn open_group_draft(&self) {
        self.group_draft.set(Some(GroupDraft::default()));
    }

    /// Closing the modal discards the draft.
    pub fn close_group_draft(&self) {
        self.group_draft.set(None);
    }
}

pub fn provide_chat_context(config: ClientConfig, restored: SessionState) -> ChatContext {
    let ctx = ChatContext::new(config, restored);
    provide_context(ctx);
    ctx
}

/// Build the context for the running app: configuration baked in at build
/// time and the session restored from `localStorage`.
///
/// # Errors
///
/// Returns the [`ConfigError`] for an invalid build-time setting.
#[cfg(feature = "hydrate")]
pub fn provide_browser_context() -> Result<ChatContext, crate::config::ConfigError> {
    let config = ClientConfig::from_build_env()?;
    let restored = crate::flows::auth::restore(&crate::util::storage::BrowserStorage);
    log::info!("client started, signed in: {}", restored.session.is_some());
    Ok(provide_chat_context(config, restored))
}

pub fn use_chat_context() -> ChatContext {
    expect_context::<ChatContext>()
}
