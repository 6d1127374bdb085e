//! Profile editing for the signed-in user.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

#[cfg(feature = "hydrate")]
use leptos::prelude::*;

#[cfg(feature = "hydrate")]
use crate::context::ChatContext;
use crate::error::ClientError;
use crate::net::api::ChatApi;
use crate::net::types::ProfileUpdate;
use crate::state::session::{Session, SessionState, persist_session};
use crate::util::storage::KeyValueStore;

pub const PROFILE_FIELDS_REQUIRED_MESSAGE: &str = "Name and email are required.";

/// Save name and email. On success the cached identity in `state` and in
/// storage both carry the new values.
///
/// # Errors
///
/// `Validation` for blank fields, `Network(Unauthenticated)` when signed
/// out, otherwise the backend failure.
pub async fn update_profile(
    api: &impl ChatApi,
    store: &impl KeyValueStore,
    state: &mut SessionState,
    name: &str,
    email: &str,
) -> Result<Session, ClientError> {
    let session = state.require()?.clone();
    let update = ProfileUpdate { name: name.trim().to_owned(), email: email.trim().to_owned() };
    if update.name.is_empty() || update.email.is_empty() {
        return Err(ClientError::Validation(PROFILE_FIELDS_REQUIRED_MESSAGE.to_owned()));
    }

    api.update_user(&session, &session.user_id, &update).await.map_err(|e| {
        log::warn!("profile update failed: {e}");
        ClientError::from(e)
    })?;

    state.apply_profile(&update.name, &update.email);
    let updated = Session { display_name: update.name, email: update.email, ..session };
    persist_session(store, &updated);
    log::info!("profile updated for user {}", updated.user_id);
    Ok(updated)
}

/// Save the profile form and fold the result into the session signal.
#[cfg(feature = "hydrate")]
pub fn spawn_profile_update(
    ctx: ChatContext,
    name: &str,
    email: &str,
    on_done: impl FnOnce(Result<(), ClientError>) + 'static,
) {
    let mut state = ctx.session.get_untracked();
    let api = crate::net::api::HttpChatApi::new(&ctx.config.get_value());
    let (name, email) = (name.to_owned(), email.to_owned());
    leptos::task::spawn_local(async move {
        let result = update_profile(&api, &crate::util::storage::BrowserStorage, &mut state, &name, &email).await;
        if let Ok(updated) = &result {
            let _ = ctx.session.try_update(|s| s.apply_refreshed(updated));
        }
        on_done(result.map(|_| ()));
    });
}
