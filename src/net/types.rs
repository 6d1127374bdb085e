//! Wire DTOs for the REST API and realtime events.
//!
//! DESIGN
//! ======
//! The backend has shipped several spellings of the same fields across
//! revisions (`content` vs `text`, numeric vs string ids, `createdAt` vs
//! `sentAt`). These types accept all of them so callers only ever see one
//! shape.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /signup`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Response of `POST /login`.
///
/// Identity fields arrive either flat next to the token or nested in `user`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default, rename = "userId", alias = "id", deserialize_with = "deserialize_opt_scalar")]
    pub user_id: Option<String>,
    #[serde(default, alias = "userName")]
    pub name: Option<String>,
    #[serde(default, alias = "userEmail")]
    pub email: Option<String>,
}

/// A user as returned by `GET /me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id", alias = "userId", deserialize_with = "deserialize_scalar")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// One conversation (direct or group) in the list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    #[serde(deserialize_with = "deserialize_scalar")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub updated_at: Option<String>,
}

/// A message as returned by `GET /message/:chatId` and pushed by the
/// realtime `newMessage` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default, alias = "content", alias = "message", deserialize_with = "deserialize_nullable_string")]
    pub text: String,
    #[serde(default, rename = "fileURL", alias = "fileUrl")]
    pub file_url: Option<String>,
    #[serde(default, rename = "senderId", alias = "userId", deserialize_with = "deserialize_opt_scalar")]
    pub sender_id: Option<String>,
    #[serde(default, rename = "sentAt", alias = "createdAt", deserialize_with = "deserialize_opt_scalar")]
    pub sent_at: Option<String>,
    /// Correlation id echoed back for messages this client created.
    #[serde(default, rename = "clientId")]
    pub client_id: Option<String>,
}

/// Body of `POST /users/validate-emails`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidateEmailsRequest<'a> {
    pub emails: &'a [String],
}

/// Response of `POST /users/validate-emails`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ValidateEmailsResponse {
    #[serde(rename = "validEmails", default)]
    pub valid_emails: Vec<String>,
}

/// A group conversation to create. `participants` excludes the creator; the
/// backend adds them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupRequest {
    pub name: String,
    pub description: String,
    pub participants: Vec<String>,
}

/// JSON body of `POST /groups`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupsBody<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub members: &'a [String],
}

impl<'a> From<&'a GroupRequest> for GroupsBody<'a> {
    fn from(request: &'a GroupRequest) -> Self {
        Self { name: &request.name, description: &request.description, members: &request.participants }
    }
}

/// Body of `PUT /users/update/:id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

/// Multipart fields of `POST /message/create/:chatId`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMessage {
    pub content: String,
    pub client_id: String,
}

/// Error body the backend attaches to non-2xx responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

fn scalar_to_string<E: serde::de::Error>(value: serde_json::Value) -> Result<Option<String>, E> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(E::custom(format!("expected string or number, got {other}"))),
    }
}

fn deserialize_opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_to_string(serde_json::Value::deserialize(deserializer)?)
}

fn deserialize_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_opt_scalar(deserializer)?.ok_or_else(|| D::Error::custom("expected string or number, got null"))
}

fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
