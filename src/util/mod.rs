//! Utility helpers shared across state and flow modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/environment concerns (storage, clock) and
//! small pure helpers (highlighting) from state and flow logic.

pub mod clock;
pub mod highlight;
pub mod storage;
