//! REST client for the OxiZap backend.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Native builds: every call returns [`ApiError::Unavailable`], which keeps
//! the crate testable off-browser through the [`ChatApi`] seam.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures map to `ApiError::Network`, non-2xx responses to
//! `ApiError::Status` carrying the backend's `error` text, and bodies that
//! don't parse to `ApiError::Decode`. Flows decide what the user sees.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::types::{
    AuthResponse, ChatSummary, GroupRequest, LoginRequest, NewMessage, ProfileUpdate, SignupRequest, UserProfile,
    WireMessage,
};
#[cfg(feature = "hydrate")]
use super::types::{GroupsBody, ValidateEmailsRequest, ValidateEmailsResponse};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::state::session::Session;

pub const SEARCH_TERM_PARAM: &str = "searchTerm";

#[cfg(any(test, feature = "hydrate"))]
fn chat_endpoint(chat_id: &str) -> String {
    format!("/chat/{chat_id}")
}

#[cfg(any(test, feature = "hydrate"))]
fn messages_endpoint(chat_id: &str) -> String {
    format!("/message/{chat_id}")
}

#[cfg(any(test, feature = "hydrate"))]
fn create_message_endpoint(chat_id: &str) -> String {
    format!("/message/create/{chat_id}")
}

#[cfg(any(test, feature = "hydrate"))]
fn update_user_endpoint(user_id: &str) -> String {
    format!("/users/update/{user_id}")
}

#[cfg(any(test, feature = "hydrate"))]
fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Query pairs for `GET /chat`. An empty term still sends the parameter so
/// the backend returns the unfiltered list.
#[cfg(any(test, feature = "hydrate"))]
fn search_query(term: &str) -> [(&'static str, &str); 1] {
    [(SEARCH_TERM_PARAM, term.trim())]
}

/// Build the error for a non-2xx response from its status and raw body.
#[cfg(any(test, feature = "hydrate"))]
fn status_error(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<super::types::ErrorBody>(body)
        .ok()
        .and_then(super::types::ErrorBody::into_message);
    ApiError::Status { status, message }
}

/// Backend operations used by the flows.
///
/// Protected calls take the [`Session`] whose bearer token authorizes them;
/// callers obtain it through `SessionState::require`, so a signed-out client
/// never reaches the network.
#[allow(async_fn_in_trait)]
pub trait ChatApi {
    /// `POST /login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;
    /// `POST /signup`
    async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError>;
    /// `GET /me`
    async fn me(&self, session: &Session) -> Result<UserProfile, ApiError>;
    /// `GET /chat?searchTerm=`
    async fn list_chats(&self, session: &Session, term: &str) -> Result<Vec<ChatSummary>, ApiError>;
    /// `GET /chat/:id`
    async fn chat(&self, session: &Session, chat_id: &str) -> Result<ChatSummary, ApiError>;
    /// `GET /message/:chatId`
    async fn messages(&self, session: &Session, chat_id: &str) -> Result<Vec<WireMessage>, ApiError>;
    /// `POST /message/create/:chatId` (multipart)
    async fn create_message(&self, session: &Session, chat_id: &str, message: &NewMessage) -> Result<(), ApiError>;
    /// `POST /users/validate-emails`, returning the subset the backend knows.
    async fn validate_emails(&self, session: &Session, emails: &[String]) -> Result<Vec<String>, ApiError>;
    /// `POST /chat/create` (multipart)
    async fn create_chat(&self, session: &Session, group: &GroupRequest) -> Result<(), ApiError>;
    /// `POST /groups` (JSON)
    async fn create_group(&self, session: &Session, group: &GroupRequest) -> Result<(), ApiError>;
    /// `PUT /users/update/:id`
    async fn update_user(&self, session: &Session, user_id: &str, update: &ProfileUpdate) -> Result<(), ApiError>;
}

/// [`ChatApi`] over HTTP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpChatApi {
    base_url: String,
}

impl HttpChatApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self { base_url: config.api_base_url.clone() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(feature = "hydrate")]
mod http {
    use gloo_net::http::{RequestBuilder, Response};
    use serde::de::DeserializeOwned;

    use super::{ApiError, status_error};

    fn network(e: impl std::fmt::Display) -> ApiError {
        ApiError::Network(e.to_string())
    }

    pub(super) fn authorized(builder: RequestBuilder, bearer: &str) -> RequestBuilder {
        builder.header("Authorization", bearer)
    }

    pub(super) async fn check(resp: Response) -> Result<Response, ApiError> {
        if resp.ok() {
            return Ok(resp);
        }
        let status = resp.status();
        let url = resp.url();
        let body = resp.text().await.unwrap_or_default();
        let err = status_error(status, &body);
        log::warn!("request to {url} failed: {err}");
        Err(err)
    }

    pub(super) async fn send(request: gloo_net::http::Request) -> Result<Response, ApiError> {
        check(request.send().await.map_err(network)?).await
    }

    pub(super) async fn send_builder(builder: RequestBuilder) -> Result<Response, ApiError> {
        check(builder.send().await.map_err(network)?).await
    }

    pub(super) async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let text = resp.text().await.map_err(network)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(super) fn json_body<B: serde::Serialize>(
        builder: RequestBuilder,
        body: &B,
    ) -> Result<gloo_net::http::Request, ApiError> {
        builder.json(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub(super) fn form(fields: &[(&str, &str)]) -> Result<web_sys::FormData, ApiError> {
        let data = web_sys::FormData::new().map_err(|e| ApiError::Network(format!("{e:?}")))?;
        for (name, value) in fields {
            data.append_with_str(name, value).map_err(|e| ApiError::Network(format!("{e:?}")))?;
        }
        Ok(data)
    }

    pub(super) fn form_body(
        builder: RequestBuilder,
        data: web_sys::FormData,
    ) -> Result<gloo_net::http::Request, ApiError> {
        builder.body(data).map_err(network)
    }
}

impl ChatApi for HttpChatApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let builder = Request::post(&join_url(&self.base_url, "/login"));
            let resp = http::send(http::json_body(builder, request)?).await?;
            http::decode(resp).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = request;
            Err(ApiError::Unavailable)
        }
    }

    async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let builder = Request::post(&join_url(&self.base_url, "/signup"));
            http::send(http::json_body(builder, request)?).await?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = request;
            Err(ApiError::Unavailable)
        }
    }

    async fn me(&self, session: &Session) -> Result<UserProfile, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let builder = http::authorized(Request::get(&join_url(&self.base_url, "/me")), &session.bearer());
            http::decode(http::send_builder(builder).await?).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = session;
            Err(ApiError::Unavailable)
        }
    }

    async fn list_chats(&self, session: &Session, term: &str) -> Result<Vec<ChatSummary>, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let builder = Request::get(&join_url(&self.base_url, "/chat")).query(search_query(term));
            let builder = http::authorized(builder, &session.bearer());
            http::decode(http::send_builder(builder).await?).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, term);
            Err(ApiError::Unavailable)
        }
    }

    async fn chat(&self, session: &Session, chat_id: &str) -> Result<ChatSummary, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let url = join_url(&self.base_url, &chat_endpoint(chat_id));
            let builder = http::authorized(Request::get(&url), &session.bearer());
            http::decode(http::send_builder(builder).await?).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, chat_id);
            Err(ApiError::Unavailable)
        }
    }

    async fn messages(&self, session: &Session, chat_id: &str) -> Result<Vec<WireMessage>, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let url = join_url(&self.base_url, &messages_endpoint(chat_id));
            let builder = http::authorized(Request::get(&url), &session.bearer());
            http::decode(http::send_builder(builder).await?).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, chat_id);
            Err(ApiError::Unavailable)
        }
    }

    async fn create_message(&self, session: &Session, chat_id: &str, message: &NewMessage) -> Result<(), ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let url = join_url(&self.base_url, &create_message_endpoint(chat_id));
            let builder = http::authorized(Request::post(&url), &session.bearer());
            let data = http::form(&[("content", message.content.as_str()), ("clientId", message.client_id.as_str())])?;
            http::send(http::form_body(builder, data)?).await?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, chat_id, message);
            Err(ApiError::Unavailable)
        }
    }

    async fn validate_emails(&self, session: &Session, emails: &[String]) -> Result<Vec<String>, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let url = join_url(&self.base_url, "/users/validate-emails");
            let builder = http::authorized(Request::post(&url), &session.bearer());
            let request = http::json_body(builder, &ValidateEmailsRequest { emails })?;
            let body: ValidateEmailsResponse = http::decode(http::send(request).await?).await?;
            Ok(body.valid_emails)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, emails);
            Err(ApiError::Unavailable)
        }
    }

    async fn create_chat(&self, session: &Session, group: &GroupRequest) -> Result<(), ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let url = join_url(&self.base_url, "/chat/create");
            let builder = http::authorized(Request::post(&url), &session.bearer());
            let mut fields = vec![("name", group.name.as_str()), ("description", group.description.as_str())];
            fields.extend(group.participants.iter().map(|p| ("participants", p.as_str())));
            let data = http::form(&fields)?;
            http::send(http::form_body(builder, data)?).await?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, group);
            Err(ApiError::Unavailable)
        }
    }

    async fn create_group(&self, session: &Session, group: &GroupRequest) -> Result<(), ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let url = join_url(&self.base_url, "/groups");
            let builder = http::authorized(Request::post(&url), &session.bearer());
            http::send(http::json_body(builder, &GroupsBody::from(group))?).await?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, group);
            Err(ApiError::Unavailable)
        }
    }

    async fn update_user(&self, session: &Session, user_id: &str, update: &ProfileUpdate) -> Result<(), ApiError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;
            let url = join_url(&self.base_url, &update_user_endpoint(user_id));
            let builder = http::authorized(Request::put(&url), &session.bearer());
            http::send(http::json_body(builder, update)?).await?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, user_id, update);
            Err(ApiError::Unavailable)
        }
    }
}
