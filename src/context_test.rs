use super::*;
use crate::state::session::Session;

fn session() -> SessionState {
    SessionState::signed_in(Session {
        user_id: "u1".to_owned(),
        display_name: "Ann".to_owned(),
        email: "ann@x.com".to_owned(),
        token: "jwt".to_owned(),
    })
}

#[test]
fn provided_context_is_readable_and_shares_signals() {
    let owner = Owner::new();
    owner.with(|| {
        let provided = provide_chat_context(ClientConfig::default(), session());
        let used = use_chat_context();

        used.session.update(|s| {
            s.apply_profile("Ann B", "annb@x.com");
        });
        assert_eq!(provided.session.with_untracked(|s| s.display_name().to_owned()), "Ann B");
        assert_eq!(used.config.with_value(|c| c.search_debounce_ms), 200);
        assert_eq!(provided.room.with_untracked(|r| r.phase), crate::state::room::RoomPhase::Closed);
    });
}

#[test]
fn group_draft_exists_only_while_modal_is_open() {
    let owner = Owner::new();
    owner.with(|| {
        let ctx = ChatContext::new(ClientConfig::default(), SessionState::default());
        assert_eq!(ctx.group_draft.get_untracked(), None);

        ctx.open_group_draft();
        ctx.group_draft.update(|d| {
            if let Some(draft) = d.as_mut() {
                draft.name = "Family".to_owned();
            }
        });
        assert_eq!(ctx.group_draft.with_untracked(|d| d.as_ref().map(|d| d.name.clone())), Some("Family".to_owned()));

        ctx.close_group_draft();
        ctx.open_group_draft();
        assert_eq!(ctx.group_draft.get_untracked(), Some(GroupDraft::default()));
    });
}
