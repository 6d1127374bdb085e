//! Authenticated identity for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! One [`SessionState`] signal lives in `ChatContext`; every flow that needs
//! identity or the token reads it from there. The same fields are mirrored
//! into durable storage so a reload restores the session.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::error::ApiError;
use crate::net::types::AuthResponse;
use crate::util::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "userId";
pub const USER_NAME_KEY: &str = "userName";
pub const USER_EMAIL_KEY: &str = "userEmail";

/// Every key the session occupies in durable storage.
pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, USER_ID_KEY, USER_NAME_KEY, USER_EMAIL_KEY];

const FALLBACK_DISPLAY_NAME: &str = "User";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub token: String,
}

impl Session {
    /// Build a session from a login response.
    ///
    /// `login_email` fills in the email when the backend omits it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the response has no token or no user id.
    pub fn from_auth(response: AuthResponse, login_email: &str) -> Result<Self, ApiError> {
        if response.token.trim().is_empty() {
            return Err(ApiError::Decode("login response missing token".to_owned()));
        }
        let (nested_id, nested_name, nested_email) = match response.user {
            Some(user) => (Some(user.id), Some(user.name), Some(user.email)),
            None => (None, None, None),
        };
        let user_id = nested_id
            .or(response.user_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Decode("login response missing user id".to_owned()))?;
        let display_name = nested_name.or(response.name).unwrap_or_default();
        let email = nested_email
            .filter(|e| !e.is_empty())
            .or(response.email)
            .unwrap_or_else(|| login_email.to_owned());

        Ok(Self { user_id, display_name, email, token: response.token })
    }

    /// Value of the `Authorization` header for this session.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Reactive auth state. `loading` is true while a stored session is being
/// checked against the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub loading: bool,
}

impl SessionState {
    pub fn signed_in(session: Session) -> Self {
        Self { session: Some(session), loading: false }
    }

    /// The active session, or [`ApiError::Unauthenticated`] so protected
    /// calls never go out without a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthenticated`] when signed out.
    pub fn require(&self) -> Result<&Session, ApiError> {
        self.session.as_ref().ok_or(ApiError::Unauthenticated)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    /// Name for list and room headers.
    pub fn display_name(&self) -> &str {
        self.session
            .as_ref()
            .map(|s| s.display_name.as_str())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }

    /// Take name/email from a session fetched for the same user. Returns
    /// `false` when the user signed out or changed in the meantime.
    pub fn apply_refreshed(&mut self, refreshed: &Session) -> bool {
        if self.user_id() != Some(refreshed.user_id.as_str()) {
            return false;
        }
        self.apply_profile(&refreshed.display_name, &refreshed.email)
    }

    /// Replace the cached name/email. Returns `false` when signed out.
    pub fn apply_profile(&mut self, name: &str, email: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.display_name = name.to_owned();
        session.email = email.to_owned();
        true
    }
}

pub fn persist_session(store: &impl KeyValueStore, session: &Session) {
    store.set(TOKEN_KEY, &session.token);
    store.set(USER_ID_KEY, &session.user_id);
    store.set(USER_NAME_KEY, &session.display_name);
    store.set(USER_EMAIL_KEY, &session.email);
}

/// Load a persisted session. All four keys must be present and token and
/// user id non-empty; a partial record is treated as signed out.
pub fn restore_session(store: &impl KeyValueStore) -> Option<Session> {
    let token = store.get(TOKEN_KEY).filter(|t| !t.is_empty())?;
    let user_id = store.get(USER_ID_KEY).filter(|id| !id.is_empty())?;
    let display_name = store.get(USER_NAME_KEY)?;
    let email = store.get(USER_EMAIL_KEY)?;
    Some(Session { user_id, display_name, email, token })
}

/// Remove every session key. Returns `false` if any removal was refused;
/// the remaining keys are still attempted.
pub fn clear_session(store: &impl KeyValueStore) -> bool {
    let mut cleared = true;
    for key in SESSION_KEYS {
        if !store.remove(key) {
            log::warn!("session key {key} could not be cleared");
            cleared = false;
        }
    }
    cleared
}
