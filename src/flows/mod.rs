//! Async user flows: each one talks to the backend through [`ChatApi`] and
//! hands results back to the state models.
//!
//! SYSTEM CONTEXT
//! ==============
//! Flows take the API and storage as trait objects so they run under a plain
//! executor in tests. The `hydrate`-only controllers and `spawn_*` helpers
//! in each module wire the same flows to the signals in [`crate::context`].
//!
//! [`ChatApi`]: crate::net::api::ChatApi

pub mod auth;
pub mod chat_list;
pub mod group;
pub mod profile;
pub mod room;
