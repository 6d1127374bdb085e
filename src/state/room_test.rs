use super::*;
use crate::error::ApiError;

const ME: &str = "u1";

fn wire(text: &str, sender: &str) -> WireMessage {
    WireMessage {
        text: text.to_owned(),
        file_url: None,
        sender_id: Some(sender.to_owned()),
        sent_at: Some("2024-01-01T10:00:00Z".to_owned()),
        client_id: None,
    }
}

fn summary(id: &str, name: &str) -> ChatSummary {
    ChatSummary { id: id.to_owned(), name: name.to_owned(), avatar: Some("a.png".to_owned()), last_message: None, updated_at: None }
}

fn ready_room(chat_id: &str) -> (RoomState, u64) {
    let mut room = RoomState::default();
    let epoch = room.open(chat_id);
    room.apply_history(epoch, Ok(Vec::new()), ME);
    room.set_connection_status(epoch, ConnectionStatus::Connected);
    (room, epoch)
}

fn texts(room: &RoomState) -> Vec<&str> {
    room.transcript().map(|e| e.text.as_str()).collect()
}

// =============================================================
// lifecycle
// =============================================================

#[test]
fn default_room_is_closed() {
    let room = RoomState::default();
    assert_eq!(room.phase, RoomPhase::Closed);
    assert!(!room.can_send());
    assert_eq!(room.notice(), None);
}

#[test]
fn room_42_history_then_incoming_event() {
    let mut room = RoomState::default();
    let epoch = room.open("42");
    assert_eq!(room.phase, RoomPhase::Loading);

    room.apply_metadata(epoch, Ok(summary("42", "Family")));
    room.apply_history(epoch, Ok(vec![wire("hi", "u2"), wire("hello", ME)]), ME);
    room.set_connection_status(epoch, ConnectionStatus::Connected);
    room.apply_live(epoch, wire("how are you?", "u2"), ME);

    assert_eq!(room.phase, RoomPhase::Ready);
    assert_eq!(room.display_title(), "Family");
    assert_eq!(room.avatar.as_deref(), Some("a.png"));
    assert_eq!(texts(&room), vec!["hi", "hello", "how are you?"]);
    let directions: Vec<Direction> = room.transcript().map(|e| e.direction).collect();
    assert_eq!(directions, vec![Direction::Incoming, Direction::Outgoing, Direction::Incoming]);
    assert!(room.transcript().all(|e| e.status == DeliveryStatus::Confirmed));
    assert!(room.can_send());
}

#[test]
fn live_messages_before_history_stay_after_it() {
    let mut room = RoomState::default();
    let epoch = room.open("42");
    room.apply_live(epoch, wire("live", "u2"), ME);
    room.apply_history(epoch, Ok(vec![wire("old", "u2")]), ME);
    assert_eq!(texts(&room), vec!["old", "live"]);
}

#[test]
fn metadata_and_history_apply_in_any_order() {
    let mut room = RoomState::default();
    let epoch = room.open("42");
    room.apply_history(epoch, Ok(vec![wire("old", "u2")]), ME);
    room.apply_metadata(epoch, Ok(summary("42", "Work")));
    assert_eq!(room.display_title(), "Work");
    assert_eq!(room.phase, RoomPhase::Ready);
}

#[test]
fn metadata_failure_uses_placeholder_title() {
    let mut room = RoomState::default();
    let epoch = room.open("42");
    room.apply_metadata(epoch, Err(ApiError::Status { status: 404, message: None }.into()));
    assert_eq!(room.display_title(), PLACEHOLDER_TITLE);
}

#[test]
fn history_failure_is_ready_with_inline_notice() {
    let mut room = RoomState::default();
    let epoch = room.open("42");
    room.apply_history(epoch, Err(ApiError::Network("offline".to_owned()).into()), ME);
    assert_eq!(room.phase, RoomPhase::Ready);
    assert_eq!(room.transcript().count(), 0);
    assert_eq!(room.notice(), Some(HISTORY_FAILED_NOTICE));
}

#[test]
fn opening_another_room_discards_prior_state_and_late_events() {
    let (mut room, first) = ready_room("1");
    room.apply_live(first, wire("from room 1", "u2"), ME);

    let second = room.open("2");
    assert_ne!(first, second);
    assert_eq!(room.transcript().count(), 0);
    assert_eq!(room.title, None);
    assert_eq!(room.connection_status, ConnectionStatus::Disconnected);

    assert!(!room.apply_live(first, wire("late", "u2"), ME));
    assert!(!room.apply_history(first, Ok(vec![wire("late history", "u2")]), ME));
    assert!(!room.apply_metadata(first, Ok(summary("1", "Old"))));
    assert!(!room.set_connection_status(first, ConnectionStatus::Connected));
    assert_eq!(room.transcript().count(), 0);
    assert_eq!(room.phase, RoomPhase::Loading);
}

#[test]
fn close_discards_transcript_and_ignores_later_events() {
    let (mut room, epoch) = ready_room("42");
    room.apply_live(epoch, wire("hi", "u2"), ME);
    room.close();

    assert_eq!(room.phase, RoomPhase::Closed);
    assert_eq!(room.chat_id, None);
    assert!(!room.apply_live(epoch, wire("late", "u2"), ME));
    assert_eq!(room.transcript().count(), 0);
}

// =============================================================
// connection status
// =============================================================

#[test]
fn sending_requires_ready_and_connected() {
    let mut room = RoomState::default();
    let epoch = room.open("42");
    room.set_connection_status(epoch, ConnectionStatus::Connected);
    assert!(!room.can_send());

    room.apply_history(epoch, Ok(Vec::new()), ME);
    assert!(room.can_send());

    room.set_connection_status(epoch, ConnectionStatus::Disconnected);
    assert!(!room.can_send());
    assert_eq!(room.notice(), Some(RECONNECTING_NOTICE));

    room.set_connection_status(epoch, ConnectionStatus::Failed);
    assert_eq!(room.notice(), Some(crate::error::CHANNEL_UNAVAILABLE_MESSAGE));
    assert_eq!(room.begin_send("hi", "c1", 0.0), None);
}

// =============================================================
// sending
// =============================================================

#[test]
fn begin_send_appends_pending_entry_before_confirmation() {
    let (mut room, _) = ready_room("42");
    let outgoing = room.begin_send("  hello  ", "c1", 100.0).unwrap();

    assert_eq!(outgoing, OutgoingMessage { client_id: "c1".to_owned(), chat_id: "42".to_owned(), text: "hello".to_owned() });
    let entry = room.transcript().last().unwrap();
    assert_eq!(entry.text, "hello");
    assert_eq!(entry.direction, Direction::Outgoing);
    assert_eq!(entry.status, DeliveryStatus::Pending);
    assert_eq!(entry.queued_at_ms, Some(100.0));
}

#[test]
fn whitespace_only_send_is_a_noop() {
    let (mut room, _) = ready_room("42");
    assert_eq!(room.begin_send("   \n\t", "c1", 0.0), None);
    assert_eq!(room.begin_send("", "c2", 0.0), None);
    assert_eq!(room.transcript().count(), 0);
}

#[test]
fn confirm_and_fail_transitions() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("a", "c1", 0.0);
    room.begin_send("b", "c2", 0.0);

    assert!(room.mark_confirmed(epoch, "c1"));
    assert!(!room.mark_confirmed(epoch, "c1"));
    assert!(room.mark_failed(epoch, "c2"));
    assert!(!room.mark_failed(epoch, "c1"));
    assert!(!room.mark_confirmed(epoch + 1, "c2"));

    let statuses: Vec<DeliveryStatus> = room.transcript().map(|e| e.status).collect();
    assert_eq!(statuses, vec![DeliveryStatus::Confirmed, DeliveryStatus::Failed]);
}

#[test]
fn retry_only_applies_to_failed_entries() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("a", "c1", 0.0);
    assert_eq!(room.retry("c1", 5.0), None);

    room.mark_failed(epoch, "c1");
    let again = room.retry("c1", 50.0).unwrap();
    assert_eq!(again.text, "a");
    let entry = room.transcript().last().unwrap();
    assert_eq!(entry.status, DeliveryStatus::Pending);
    assert_eq!(entry.queued_at_ms, Some(50.0));
    assert_eq!(room.transcript().count(), 1);
}

#[test]
fn expire_pending_fails_entries_past_timeout() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("old", "c1", 0.0);
    room.begin_send("new", "c2", 9_000.0);
    room.begin_send("done", "c3", 0.0);
    room.mark_confirmed(epoch, "c3");

    assert_eq!(room.expire_pending(10_000.0, 10_000), vec!["c1".to_owned()]);
    let statuses: Vec<DeliveryStatus> = room.transcript().map(|e| e.status).collect();
    assert_eq!(statuses, vec![DeliveryStatus::Failed, DeliveryStatus::Pending, DeliveryStatus::Confirmed]);
}

// =============================================================
// echo reconciliation
// =============================================================

#[test]
fn echo_with_correlation_id_confirms_in_place() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("same", "c1", 0.0);
    room.begin_send("same", "c2", 0.0);

    let echo = WireMessage { client_id: Some("c2".to_owned()), ..wire("same", ME) };
    room.apply_live(epoch, echo, ME);

    assert_eq!(room.transcript().count(), 2);
    let statuses: Vec<DeliveryStatus> = room.transcript().map(|e| e.status).collect();
    assert_eq!(statuses, vec![DeliveryStatus::Pending, DeliveryStatus::Confirmed]);
}

#[test]
fn echo_without_correlation_id_matches_pending_entry_by_text() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("hello", "c1", 0.0);

    room.apply_live(epoch, wire("hello", ME), ME);
    assert_eq!(room.transcript().count(), 1);
    let entry = room.transcript().next().unwrap();
    assert!(entry.echoed);
    assert_eq!(entry.status, DeliveryStatus::Confirmed);
    assert_eq!(entry.sent_at.as_deref(), Some("2024-01-01T10:00:00Z"));

    // A second identical message from another tab of the same user is new.
    room.apply_live(epoch, wire("hello", ME), ME);
    assert_eq!(room.transcript().count(), 2);
}

#[test]
fn confirmed_entry_is_not_absorbed_by_same_text_from_another_device() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("ok", "c1", 0.0);
    room.mark_confirmed(epoch, "c1");

    room.apply_live(epoch, wire("ok", ME), ME);

    assert_eq!(texts(&room), vec!["ok", "ok"]);
    let last = room.transcript().last().unwrap();
    assert_eq!(last.client_id, None);
    assert_eq!(last.direction, Direction::Outgoing);
}

#[test]
fn confirmed_entry_still_matches_its_own_correlation_id() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("ok", "c1", 0.0);
    room.mark_confirmed(epoch, "c1");

    room.apply_live(epoch, WireMessage { client_id: Some("c1".to_owned()), ..wire("ok", ME) }, ME);
    assert_eq!(room.transcript().count(), 1);
    assert!(room.transcript().next().unwrap().echoed);
}

#[test]
fn echo_with_unknown_correlation_id_is_appended() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("ok", "c1", 0.0);

    room.apply_live(epoch, WireMessage { client_id: Some("other".to_owned()), ..wire("ok", ME) }, ME);
    assert_eq!(texts(&room), vec!["ok", "ok"]);
    assert_eq!(room.transcript().next().unwrap().status, DeliveryStatus::Pending);
}

#[test]
fn incoming_message_with_same_text_is_not_treated_as_echo() {
    let (mut room, epoch) = ready_room("42");
    room.begin_send("ok", "c1", 0.0);
    room.apply_live(epoch, wire("ok", "u2"), ME);
    assert_eq!(texts(&room), vec!["ok", "ok"]);
    assert_eq!(room.transcript().next().unwrap().status, DeliveryStatus::Pending);
}

#[test]
fn client_ids_are_unique_uuids() {
    let a = new_client_id();
    let b = new_client_id();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
    assert!(uuid::Uuid::parse_str(&a).is_ok());
}
