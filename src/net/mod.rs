//! Networking modules for the REST API and the realtime channel.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles REST calls, `realtime` manages the Socket.IO connection
//! lifecycle, `socket_codec` owns the Engine.IO/Socket.IO packet format, and
//! `types` defines the shared wire schema.

pub mod api;
#[cfg(test)]
pub(crate) mod fake_api;
pub mod realtime;
pub mod socket_codec;
pub mod types;
