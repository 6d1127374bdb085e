use futures::executor::block_on;

use super::*;
use crate::error::ApiError;
use crate::net::fake_api::FakeChatApi;
use crate::state::session::Session;

fn signed_in() -> SessionState {
    SessionState::signed_in(Session {
        user_id: "u1".to_owned(),
        display_name: "Ann".to_owned(),
        email: "ann@x.com".to_owned(),
        token: "jwt".to_owned(),
    })
}

fn draft(members: &[&str]) -> GroupDraft {
    GroupDraft {
        name: " Family ".to_owned(),
        description: "weekend plans".to_owned(),
        members: members.iter().map(|m| (*m).to_owned()).collect(),
        ..GroupDraft::default()
    }
}

#[test]
fn group_with_only_invalid_members_aborts_before_create() {
    let api = FakeChatApi { valid_emails: Ok(Vec::new()), ..FakeChatApi::default() };

    let err = block_on(submit_group(&api, &signed_in(), &draft(&["ghost@x.com"]), GroupEndpoint::ChatCreate)).unwrap_err();

    assert_eq!(err, ClientError::Validation(NO_VALID_MEMBERS_MESSAGE.to_owned()));
    assert_eq!(api.calls(), vec!["POST /users/validate-emails".to_owned()]);
    assert!(api.created_groups.borrow().is_empty());
}

#[test]
fn valid_members_are_deduped_and_created_once() {
    let api = FakeChatApi {
        valid_emails: Ok(vec!["bo@x.com".to_owned(), "BO@x.com".to_owned(), "cy@x.com".to_owned()]),
        ..FakeChatApi::default()
    };

    let sent =
        block_on(submit_group(&api, &signed_in(), &draft(&["bo@x.com", "cy@x.com", "nope@x.com"]), GroupEndpoint::ChatCreate))
            .unwrap();

    assert_eq!(sent.name, "Family");
    assert_eq!(sent.participants, vec!["bo@x.com".to_owned(), "cy@x.com".to_owned()]);
    assert_eq!(api.calls(), vec!["POST /users/validate-emails".to_owned(), "POST /chat/create".to_owned()]);
    assert_eq!(api.created_groups.borrow().as_slice(), [sent]);
}

#[test]
fn groups_endpoint_is_used_when_configured() {
    let api = FakeChatApi { valid_emails: Ok(vec!["bo@x.com".to_owned()]), ..FakeChatApi::default() };
    block_on(submit_group(&api, &signed_in(), &draft(&["bo@x.com"]), GroupEndpoint::Groups)).unwrap();
    assert_eq!(api.calls().last().map(String::as_str), Some("POST /groups"));
}

#[test]
fn empty_member_list_is_rejected_without_requests() {
    let api = FakeChatApi::default();
    let err = block_on(submit_group(&api, &signed_in(), &draft(&[]), GroupEndpoint::ChatCreate)).unwrap_err();
    assert_eq!(err, ClientError::Validation(NO_MEMBERS_MESSAGE.to_owned()));
    assert!(api.calls().is_empty());
}

#[test]
fn blank_name_is_rejected() {
    let api = FakeChatApi::default();
    let unnamed = GroupDraft { name: "  ".to_owned(), ..draft(&["bo@x.com"]) };
    let err = block_on(submit_group(&api, &signed_in(), &unnamed, GroupEndpoint::ChatCreate)).unwrap_err();
    assert_eq!(err, ClientError::Validation(GROUP_NAME_REQUIRED_MESSAGE.to_owned()));
}

#[test]
fn create_failure_surfaces_backend_message() {
    let api = FakeChatApi {
        valid_emails: Ok(vec!["bo@x.com".to_owned()]),
        create: Err(ApiError::Status { status: 400, message: Some("Group name taken".to_owned()) }),
        ..FakeChatApi::default()
    };
    let err = block_on(submit_group(&api, &signed_in(), &draft(&["bo@x.com"]), GroupEndpoint::ChatCreate)).unwrap_err();
    assert_eq!(err, ClientError::Validation("Group name taken".to_owned()));
}

#[test]
fn validation_request_failure_is_a_network_error() {
    let api = FakeChatApi { valid_emails: Err(ApiError::Network("offline".to_owned())), ..FakeChatApi::default() };
    let err = block_on(submit_group(&api, &signed_in(), &draft(&["bo@x.com"]), GroupEndpoint::ChatCreate)).unwrap_err();
    assert_eq!(err, ClientError::Network(ApiError::Network("offline".to_owned())));
}

#[test]
fn signed_out_submit_is_unauthenticated() {
    let api = FakeChatApi::default();
    let err = block_on(submit_group(&api, &SessionState::default(), &draft(&["bo@x.com"]), GroupEndpoint::ChatCreate))
        .unwrap_err();
    assert_eq!(err, ClientError::Network(ApiError::Unauthenticated));
}
