// ── Core error types ──
//
// What front-ends see. Transport detail (HTTP status, envelope parsing) is
// folded into `Backend` so every failed command surfaces the same way.

use pcap2socks_api::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend errors ───────────────────────────────────────────────
    /// Any failed backend command, with the backend's (or transport's)
    /// message.
    #[error("{command} failed: {message}")]
    Backend { command: Command, message: String },

    #[error("{command} returned a {actual} response")]
    UnexpectedResponse { command: Command, actual: Command },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("No valid saved {slot} configuration")]
    InvalidConfig { slot: &'static str },

    // ── Session errors ───────────────────────────────────────────────
    #[error("Another operation is in progress")]
    Busy,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn backend(command: Command, err: &pcap2socks_api::Error) -> Self {
        let message = match err.backend_message() {
            Some(msg) => msg.to_owned(),
            None => err.to_string(),
        };
        Self::Backend { command, message }
    }

    /// The command this error came from, if it came from the backend.
    pub fn command(&self) -> Option<Command> {
        match self {
            Self::Backend { command, .. } | Self::UnexpectedResponse { command, .. } => {
                Some(*command)
            }
            _ => None,
        }
    }
}
