//! Group creation: validate members, then one create call.
//!
//! DESIGN
//! ======
//! Validation runs before anything is created, so a group is never created
//! with a member list the backend would not accept. The create call is a
//! single request; there is no partial group to clean up on failure.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

#[cfg(feature = "hydrate")]
use leptos::prelude::*;

use crate::config::GroupEndpoint;
#[cfg(feature = "hydrate")]
use crate::context::ChatContext;
#[cfg(feature = "hydrate")]
use crate::flows::chat_list::ChatListController;
use crate::error::ClientError;
use crate::net::api::ChatApi;
use crate::net::types::GroupRequest;
use crate::state::group::GroupDraft;
use crate::state::session::SessionState;

pub const NO_MEMBERS_MESSAGE: &str = "Add at least one member.";
pub const NO_VALID_MEMBERS_MESSAGE: &str = "No valid members found.";
pub const GROUP_NAME_REQUIRED_MESSAGE: &str = "Enter a group name.";
pub const CREATE_FAILED_MESSAGE: &str = "Could not create the group.";

/// Confirmed identities with case-insensitive duplicates removed, first
/// spelling kept.
fn dedup_members(members: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    members
        .into_iter()
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty() && seen.insert(m.to_lowercase()))
        .collect()
}

/// Validate the draft's members and create the group on `endpoint`.
/// Returns the request that was sent.
///
/// # Errors
///
/// `Validation` for a missing name, an empty member list, or when the
/// backend confirms none of the members (no create call is made). A failed
/// create carries the backend's error text when there is one.
pub async fn submit_group(
    api: &impl ChatApi,
    state: &SessionState,
    draft: &GroupDraft,
    endpoint: GroupEndpoint,
) -> Result<GroupRequest, ClientError> {
    let session = state.require()?;
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ClientError::Validation(GROUP_NAME_REQUIRED_MESSAGE.to_owned()));
    }
    if draft.members.is_empty() {
        return Err(ClientError::Validation(NO_MEMBERS_MESSAGE.to_owned()));
    }

    let confirmed = dedup_members(api.validate_emails(session, &draft.members).await?);
    if confirmed.is_empty() {
        log::info!("group '{name}' aborted: none of {} members are valid", draft.members.len());
        return Err(ClientError::Validation(NO_VALID_MEMBERS_MESSAGE.to_owned()));
    }

    let request = GroupRequest {
        name: name.to_owned(),
        description: draft.description.trim().to_owned(),
        participants: confirmed,
    };
    let created = match endpoint {
        GroupEndpoint::ChatCreate => api.create_chat(session, &request).await,
        GroupEndpoint::Groups => api.create_group(session, &request).await,
    };
    created.map_err(|e| {
        log::warn!("group create failed: {e}");
        let message = e.server_message().unwrap_or(CREATE_FAILED_MESSAGE).to_owned();
        ClientError::Validation(message)
    })?;

    log::info!("group '{}' created with {} members", request.name, request.participants.len());
    Ok(request)
}

/// Submit the open draft. On success the modal closes and the conversation
/// list is refreshed; on failure the draft shows the error inline.
#[cfg(feature = "hydrate")]
pub fn spawn_group_submit(
    ctx: ChatContext,
    chat_list: ChatListController,
    on_done: impl FnOnce(Result<(), ClientError>) + 'static,
) {
    let Some(Some(draft)) = ctx.group_draft.try_update(|d| {
        let draft = d.as_mut()?;
        draft.begin_submit().then(|| draft.clone())
    }) else {
        return;
    };
    let state = ctx.session.get_untracked();
    let config = ctx.config.get_value();
    leptos::task::spawn_local(async move {
        let api = crate::net::api::HttpChatApi::new(&config);
        let result = submit_group(&api, &state, &draft, config.group_endpoint).await;
        match &result {
            Ok(_) => {
                ctx.close_group_draft();
                chat_list.refresh();
            }
            Err(e) => {
                let _ = ctx.group_draft.try_update(|d| {
                    if let Some(draft) = d.as_mut() {
                        draft.fail_submit(e);
                    }
                });
            }
        }
        on_done(result.map(|_| ()));
    });
}
