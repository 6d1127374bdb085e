//! Login, signup, logout and session restore.
//!
//! ERROR HANDLING
//! ==============
//! Login failures collapse into one blocking "Login failed." message whatever
//! the cause. Signup distinguishes only the duplicate-account case.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

#[cfg(feature = "hydrate")]
use leptos::prelude::*;

#[cfg(feature = "hydrate")]
use crate::context::ChatContext;
use crate::error::{ApiError, ClientError};
use crate::net::api::ChatApi;
use crate::net::types::{LoginRequest, SignupRequest};
use crate::state::session::{Session, SessionState, clear_session, persist_session, restore_session};
use crate::util::storage::KeyValueStore;

pub const AFTER_LOGIN_ROUTE: &str = "/chats";
pub const AFTER_SIGNUP_ROUTE: &str = "/";
pub const AFTER_LOGOUT_ROUTE: &str = "/";

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed.";
pub const EMAIL_IN_USE_MESSAGE: &str = "This email is already in use.";
pub const SIGNUP_FAILED_MESSAGE: &str = "Could not sign up. Check your details.";

/// Error text the backend returns when the signup email is taken.
const DUPLICATE_ACCOUNT_ERROR: &str = "User with this email already exists";

/// Authenticate, then persist the resulting session and install it in
/// `state`. On failure `state` is left signed out.
///
/// # Errors
///
/// Any failure, including a response without token or user id, becomes
/// `ClientError::Authentication(LOGIN_FAILED_MESSAGE)`.
pub async fn login(
    api: &impl ChatApi,
    store: &impl KeyValueStore,
    state: &mut SessionState,
    email: &str,
    password: &str,
) -> Result<Session, ClientError> {
    let request = LoginRequest { email: email.trim().to_owned(), password: password.to_owned() };
    let session = api.login(&request).await.and_then(|resp| Session::from_auth(resp, &request.email));
    match session {
        Ok(session) => {
            persist_session(store, &session);
            log::info!("signed in as user {}", session.user_id);
            *state = SessionState::signed_in(session.clone());
            Ok(session)
        }
        Err(e) => {
            log::warn!("login failed: {e}");
            *state = SessionState::default();
            Err(ClientError::Authentication(LOGIN_FAILED_MESSAGE.to_owned()))
        }
    }
}

fn is_duplicate_account(error: &ApiError) -> bool {
    match error {
        ApiError::Status { status: 409, .. } => true,
        ApiError::Status { message: Some(message), .. } => message == DUPLICATE_ACCOUNT_ERROR,
        _ => false,
    }
}

/// Create an account. The user signs in afterwards from the login route.
///
/// # Errors
///
/// `Authentication(EMAIL_IN_USE_MESSAGE)` for a taken email, otherwise
/// `Authentication(SIGNUP_FAILED_MESSAGE)`.
pub async fn signup(api: &impl ChatApi, name: &str, email: &str, password: &str) -> Result<(), ClientError> {
    let request =
        SignupRequest { name: name.trim().to_owned(), email: email.trim().to_owned(), password: password.to_owned() };
    api.signup(&request).await.map_err(|e| {
        log::warn!("signup failed: {e}");
        let message = if is_duplicate_account(&e) { EMAIL_IN_USE_MESSAGE } else { SIGNUP_FAILED_MESSAGE };
        ClientError::Authentication(message.to_owned())
    })
}

/// Forget the session everywhere. Protected calls fail with
/// `Unauthenticated` afterwards without reaching the network.
pub fn logout(store: &impl KeyValueStore, state: &mut SessionState) {
    clear_session(store);
    state.session = None;
    state.loading = false;
    log::info!("signed out");
}

/// Initial session state from durable storage.
pub fn restore(store: &impl KeyValueStore) -> SessionState {
    match restore_session(store) {
        Some(session) => SessionState::signed_in(session),
        None => SessionState::default(),
    }
}

/// Re-read identity from `GET /me`, then update `state` and storage with the
/// refreshed name/email.
///
/// # Errors
///
/// Returns the failure; the cached identity is kept.
pub async fn refresh_identity(
    api: &impl ChatApi,
    store: &impl KeyValueStore,
    state: &mut SessionState,
) -> Result<Session, ClientError> {
    let session = state.require()?.clone();
    let profile = api.me(&session).await.map_err(|e| {
        log::warn!("identity refresh failed: {e}");
        ClientError::from(e)
    })?;
    let mut refreshed = session;
    if !profile.name.trim().is_empty() {
        refreshed.display_name = profile.name;
    }
    if !profile.email.trim().is_empty() {
        refreshed.email = profile.email;
    }
    persist_session(store, &refreshed);
    state.apply_profile(&refreshed.display_name, &refreshed.email);
    Ok(refreshed)
}

/// Runs the auth flows against the shared session signal. Callbacks receive
/// the route to show next, or the error to surface.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy)]
pub struct AuthController {
    ctx: ChatContext,
}

#[cfg(feature = "hydrate")]
impl AuthController {
    pub fn new(ctx: ChatContext) -> Self {
        Self { ctx }
    }

    fn api(&self) -> crate::net::api::HttpChatApi {
        crate::net::api::HttpChatApi::new(&self.ctx.config.get_value())
    }

    pub fn login(
        &self,
        email: &str,
        password: &str,
        on_done: impl FnOnce(Result<&'static str, ClientError>) + 'static,
    ) {
        let session = self.ctx.session;
        let api = self.api();
        let (email, password) = (email.to_owned(), password.to_owned());
        let _ = session.try_update(|s| s.loading = true);
        leptos::task::spawn_local(async move {
            let mut state = SessionState::default();
            let result = login(&api, &crate::util::storage::BrowserStorage, &mut state, &email, &password).await;
            let _ = session.try_set(state);
            on_done(result.map(|_| AFTER_LOGIN_ROUTE));
        });
    }

    pub fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        on_done: impl FnOnce(Result<&'static str, ClientError>) + 'static,
    ) {
        let api = self.api();
        let (name, email, password) = (name.to_owned(), email.to_owned(), password.to_owned());
        leptos::task::spawn_local(async move {
            let result = signup(&api, &name, &email, &password).await;
            on_done(result.map(|()| AFTER_SIGNUP_ROUTE));
        });
    }

    /// Sign out and drop every signed-in view state. Returns the route to
    /// show next.
    pub fn logout(&self) -> &'static str {
        self.ctx.session.update(|s| logout(&crate::util::storage::BrowserStorage, s));
        self.ctx.room.update(crate::state::room::RoomState::close);
        self.ctx.chat_list.set(crate::state::chat_list::ChatListState::default());
        self.ctx.close_group_draft();
        AFTER_LOGOUT_ROUTE
    }

    /// Refresh name/email from `GET /me` in the background.
    pub fn refresh_identity(&self) {
        let session = self.ctx.session;
        let mut state = session.get_untracked();
        if state.session.is_none() {
            return;
        }
        let api = self.api();
        let _ = session.try_update(|s| s.loading = true);
        leptos::task::spawn_local(async move {
            let result = refresh_identity(&api, &crate::util::storage::BrowserStorage, &mut state).await;
            let _ = session.try_update(|s| {
                s.loading = false;
                if let Ok(refreshed) = &result {
                    s.apply_refreshed(refreshed);
                }
            });
        });
    }
}
