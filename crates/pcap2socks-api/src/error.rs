use thiserror::Error;

/// Top-level error type for the `pcap2socks-api` crate.
///
/// Covers every way a backend invocation can fail: the transport could not
/// deliver the command, the backend rejected it, or the backend answered
/// with a payload whose shape does not match the command.
/// `pcap2socks-core` rewraps these uniformly for the front-ends.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The backend answered with a non-success HTTP status.
    #[error("Backend returned HTTP {status}")]
    Status { status: u16, body: String },

    // ── Backend ─────────────────────────────────────────────────────
    /// The backend processed the command and reported a failure.
    #[error("{message}")]
    Backend { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// The message the backend itself reported, if this error came from it.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message } => Some(message),
            _ => None,
        }
    }
}
