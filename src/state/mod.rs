//! Reactive state models held in `RwSignal`s by [`crate::context`].
//!
//! SYSTEM CONTEXT
//! ==============
//! Each model is plain data plus synchronous transitions. Async work lives in
//! `flows`; results come back through methods that check an epoch or
//! sequence number so late completions can't overwrite newer state.

pub mod chat_list;
pub mod group;
pub mod room;
pub mod session;
