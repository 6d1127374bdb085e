//! # oxizap
//!
//! Browser-side core of the OxiZap messaging client: session handling, the
//! REST client, the Socket.IO realtime channel, and the reactive state and
//! flows behind the conversation list, conversation room, group creation,
//! and profile screens.
//!
//! Views are not part of this crate. A Leptos view layer reads the signals in
//! [`context::ChatContext`] and calls into [`flows`].
//!
//! Browser-only code (HTTP, websocket, `localStorage`, timers) is gated
//! behind the `hydrate` feature; everything else builds and tests natively.

pub mod config;
pub mod context;
pub mod error;
pub mod flows;
pub mod net;
pub mod state;
pub mod util;

/// Install the panic hook and route `log` output to the browser console.
#[cfg(feature = "hydrate")]
pub fn init_browser_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        log::debug!("console logger already installed");
    }
}
