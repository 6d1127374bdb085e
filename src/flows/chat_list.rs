//! Conversation list fetching and debounced search.
//!
//! DESIGN
//! ======
//! Each keystroke replaces the pending debounce timer, so only the last term
//! typed within the window is fetched. Requests already in flight are not
//! cancelled; `ChatListState` drops their responses by sequence number.

#[cfg(test)]
#[path = "chat_list_test.rs"]
mod chat_list_test;

#[cfg(feature = "hydrate")]
use std::cell::RefCell;
#[cfg(feature = "hydrate")]
use std::rc::Rc;

#[cfg(feature = "hydrate")]
use leptos::prelude::*;

#[cfg(feature = "hydrate")]
use crate::context::ChatContext;
use crate::error::ClientError;
use crate::net::api::ChatApi;
use crate::net::types::ChatSummary;
use crate::state::session::SessionState;

/// `GET /chat?searchTerm=` for the signed-in user.
///
/// # Errors
///
/// `Network(Unauthenticated)` when signed out (no request is made), or the
/// transport failure.
pub async fn fetch_chats(api: &impl ChatApi, state: &SessionState, term: &str) -> Result<Vec<ChatSummary>, ClientError> {
    let session = state.require()?;
    Ok(api.list_chats(session, term.trim()).await?)
}

/// Drives list fetches from search input.
#[cfg(feature = "hydrate")]
#[derive(Clone)]
pub struct ChatListController {
    ctx: ChatContext,
    pending: Rc<RefCell<Option<gloo_timers::callback::Timeout>>>,
}

#[cfg(feature = "hydrate")]
impl ChatListController {
    pub fn new(ctx: ChatContext) -> Self {
        Self { ctx, pending: Rc::new(RefCell::new(None)) }
    }

    /// Record the new term and (re)start the debounce timer.
    pub fn on_search_input(&self, term: &str) {
        self.ctx.chat_list.update(|list| list.set_search_term(term));
        let delay_ms = self.ctx.config.with_value(|c| c.search_debounce_ms);
        let ctx = self.ctx;
        let timeout = gloo_timers::callback::Timeout::new(delay_ms, move || spawn_fetch(ctx));
        // Dropping the previous timer cancels it.
        *self.pending.borrow_mut() = Some(timeout);
    }

    /// Fetch now with the current term, e.g. after a group was created.
    pub fn refresh(&self) {
        self.pending.borrow_mut().take();
        spawn_fetch(self.ctx);
    }
}

#[cfg(feature = "hydrate")]
fn spawn_fetch(ctx: ChatContext) {
    let Some(request) = ctx.chat_list.try_update(|list| list.begin_fetch()) else {
        return;
    };
    let api = crate::net::api::HttpChatApi::new(&ctx.config.get_value());
    let state = ctx.session.get_untracked();
    leptos::task::spawn_local(async move {
        let result = fetch_chats(&api, &state, &request.term).await;
        let _ = ctx.chat_list.try_update(|list| list.apply_results(request.seq, result));
    });
}
