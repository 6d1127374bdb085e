use super::*;

#[test]
fn add_member_trims_and_appends() {
    let mut draft = GroupDraft::default();
    draft.add_member("  ana@x.com ").unwrap();
    assert_eq!(draft.members, vec!["ana@x.com".to_owned()]);
    assert_eq!(draft.error, None);
}

#[test]
fn empty_member_is_rejected_with_inline_error() {
    let mut draft = GroupDraft::default();
    assert_eq!(draft.add_member("   "), Err(ClientError::Validation(EMPTY_MEMBER_MESSAGE.to_owned())));
    assert_eq!(draft.error.as_deref(), Some(EMPTY_MEMBER_MESSAGE));
    assert!(draft.members.is_empty());
}

#[test]
fn duplicate_member_is_rejected_case_insensitively() {
    let mut draft = GroupDraft::default();
    draft.add_member("Ana@X.com").unwrap();
    assert_eq!(draft.add_member("ana@x.com"), Err(ClientError::Validation(DUPLICATE_MEMBER_MESSAGE.to_owned())));
    assert_eq!(draft.members.len(), 1);
}

#[test]
fn successful_add_clears_previous_error() {
    let mut draft = GroupDraft::default();
    let _ = draft.add_member("");
    draft.add_member("bo@x.com").unwrap();
    assert_eq!(draft.error, None);
}

#[test]
fn comma_separated_list_skips_blanks_and_duplicates() {
    let mut draft = GroupDraft::default();
    draft.add_member("a@x.com").unwrap();
    assert_eq!(draft.add_members_from_list("b@x.com, ,A@x.com,c@x.com,,"), 2);
    assert_eq!(draft.members, vec!["a@x.com".to_owned(), "b@x.com".to_owned(), "c@x.com".to_owned()]);
}

#[test]
fn remove_member_reports_whether_anything_changed() {
    let mut draft = GroupDraft::default();
    draft.add_member("a@x.com").unwrap();
    assert!(draft.remove_member("a@x.com"));
    assert!(!draft.remove_member("a@x.com"));
    assert!(draft.members.is_empty());
}

#[test]
fn submit_cannot_start_twice() {
    let mut draft = GroupDraft { error: Some("stale".to_owned()), ..GroupDraft::default() };
    assert!(draft.begin_submit());
    assert!(draft.submitting);
    assert_eq!(draft.error, None);
    assert!(!draft.begin_submit());
}

#[test]
fn failed_submit_shows_message_and_allows_retry() {
    let mut draft = GroupDraft::default();
    draft.begin_submit();
    draft.fail_submit(&ClientError::Validation("No valid members found.".to_owned()));
    assert!(!draft.submitting);
    assert_eq!(draft.error.as_deref(), Some("No valid members found."));
    assert!(draft.begin_submit());
}
