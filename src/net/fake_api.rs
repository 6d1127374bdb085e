//! In-memory [`ChatApi`] for flow tests.

use std::cell::RefCell;

use super::api::ChatApi;
use super::types::{
    AuthResponse, ChatSummary, GroupRequest, LoginRequest, NewMessage, ProfileUpdate, SignupRequest, UserProfile,
    WireMessage,
};
use crate::error::ApiError;
use crate::state::session::Session;

/// Canned responses plus a log of every request, formatted `"METHOD /path"`.
pub(crate) struct FakeChatApi {
    pub login: Result<AuthResponse, ApiError>,
    pub signup: Result<(), ApiError>,
    pub me: Result<UserProfile, ApiError>,
    pub chats: Result<Vec<ChatSummary>, ApiError>,
    pub chat: Result<ChatSummary, ApiError>,
    pub messages: Result<Vec<WireMessage>, ApiError>,
    pub create_message: Result<(), ApiError>,
    pub valid_emails: Result<Vec<String>, ApiError>,
    pub create: Result<(), ApiError>,
    pub update_user: Result<(), ApiError>,
    pub calls: RefCell<Vec<String>>,
    pub sent_messages: RefCell<Vec<(String, NewMessage)>>,
    pub created_groups: RefCell<Vec<GroupRequest>>,
    pub profile_updates: RefCell<Vec<ProfileUpdate>>,
}

impl Default for FakeChatApi {
    fn default() -> Self {
        Self {
            login: Err(ApiError::Unavailable),
            signup: Ok(()),
            me: Err(ApiError::Unavailable),
            chats: Ok(Vec::new()),
            chat: Err(ApiError::Unavailable),
            messages: Ok(Vec::new()),
            create_message: Ok(()),
            valid_emails: Ok(Vec::new()),
            create: Ok(()),
            update_user: Ok(()),
            calls: RefCell::new(Vec::new()),
            sent_messages: RefCell::new(Vec::new()),
            created_groups: RefCell::new(Vec::new()),
            profile_updates: RefCell::new(Vec::new()),
        }
    }
}

impl FakeChatApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl ChatApi for FakeChatApi {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.record("POST /login".to_owned());
        self.login.clone()
    }

    async fn signup(&self, _request: &SignupRequest) -> Result<(), ApiError> {
        self.record("POST /signup".to_owned());
        self.signup.clone()
    }

    async fn me(&self, _session: &Session) -> Result<UserProfile, ApiError> {
        self.record("GET /me".to_owned());
        self.me.clone()
    }

    async fn list_chats(&self, _session: &Session, term: &str) -> Result<Vec<ChatSummary>, ApiError> {
        self.record(format!("GET /chat?searchTerm={term}"));
        self.chats.clone()
    }

    async fn chat(&self, _session: &Session, chat_id: &str) -> Result<ChatSummary, ApiError> {
        self.record(format!("GET /chat/{chat_id}"));
        self.chat.clone()
    }

    async fn messages(&self, _session: &Session, chat_id: &str) -> Result<Vec<WireMessage>, ApiError> {
        self.record(format!("GET /message/{chat_id}"));
        self.messages.clone()
    }

    async fn create_message(&self, _session: &Session, chat_id: &str, message: &NewMessage) -> Result<(), ApiError> {
        self.record(format!("POST /message/create/{chat_id}"));
        self.sent_messages.borrow_mut().push((chat_id.to_owned(), message.clone()));
        self.create_message.clone()
    }

    async fn validate_emails(&self, _session: &Session, _emails: &[String]) -> Result<Vec<String>, ApiError> {
        self.record("POST /users/validate-emails".to_owned());
        self.valid_emails.clone()
    }

    async fn create_chat(&self, _session: &Session, group: &GroupRequest) -> Result<(), ApiError> {
        self.record("POST /chat/create".to_owned());
        self.created_groups.borrow_mut().push(group.clone());
        self.create.clone()
    }

    async fn create_group(&self, _session: &Session, group: &GroupRequest) -> Result<(), ApiError> {
        self.record("POST /groups".to_owned());
        self.created_groups.borrow_mut().push(group.clone());
        self.create.clone()
    }

    async fn update_user(&self, _session: &Session, user_id: &str, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.record(format!("PUT /users/update/{user_id}"));
        self.profile_updates.borrow_mut().push(update.clone());
        self.update_user.clone()
    }
}
