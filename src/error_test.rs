use super::*;

#[test]
fn authentication_is_blocking_everything_else_inline() {
    assert_eq!(ClientError::Authentication("Login failed.".into()).severity(), Severity::Blocking);
    assert_eq!(ClientError::Validation("x".into()).severity(), Severity::Inline);
    assert_eq!(ClientError::Network(ApiError::Network("down".into())).severity(), Severity::Inline);
    assert_eq!(ClientError::Channel(ChannelError::NotConnected).severity(), Severity::Inline);
}

#[test]
fn user_message_passes_through_auth_and_validation_text() {
    assert_eq!(ClientError::Validation("No valid members found.".into()).user_message(), "No valid members found.");
    assert_eq!(ClientError::Authentication("Login failed.".into()).to_string(), "Login failed.");
}

#[test]
fn user_message_hides_transport_details() {
    let err = ClientError::from(ApiError::Status { status: 500, message: Some("stack trace".into()) });
    assert!(!err.user_message().contains("stack trace"));
}

#[test]
fn server_message_only_for_status_errors() {
    let status = ApiError::Status { status: 409, message: Some("User with this email already exists".into()) };
    assert_eq!(status.server_message(), Some("User with this email already exists"));
    assert_eq!(ApiError::Network("offline".into()).server_message(), None);
}
