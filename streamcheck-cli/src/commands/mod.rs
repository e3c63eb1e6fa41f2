//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Publishes a stream and holds it live.
pub mod publish;

/// Captures and analyzes a stream URL.
pub mod probe;

/// The publish-then-probe round trip.
pub mod check;

use tokio_util::sync::CancellationToken;

/// A root token cancelled on Ctrl-C, so every supervisor winds down cleanly.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping");
            on_signal.cancel();
        }
    });
    token
}
