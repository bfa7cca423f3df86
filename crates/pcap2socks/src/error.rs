//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use pcap2socks_api::Command;
use pcap2socks_config::ConfigError;
use pcap2socks_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const BACKEND: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(dead_code, unused_assignments)]
pub enum CliError {
    // ── Backend ──────────────────────────────────────────────────────
    #[error("{command} failed: {message}")]
    #[diagnostic(
        code(pcap2socks::backend),
        help(
            "Check that the pcap2socks backend is running and reachable.\n\
             Point at it with --endpoint or backend.endpoint in the settings file."
        )
    )]
    Backend { command: Command, message: String },

    #[error("Backend answered {command} with a {actual} response")]
    #[diagnostic(
        code(pcap2socks::protocol),
        help("The backend and this CLI disagree on the command protocol; update one of them.")
    )]
    Protocol { command: Command, actual: Command },

    // ── Saved configuration ──────────────────────────────────────────
    #[error("No valid saved {slot} configuration")]
    #[diagnostic(
        code(pcap2socks::no_saved_config),
        help("Save one with: pcap2socks config set-{slot}")
    )]
    NoSavedConfig { slot: &'static str },

    #[error("Saved interface '{interface}' is no longer available")]
    #[diagnostic(
        code(pcap2socks::interface_missing),
        help(
            "The network interfaces changed since the last run.\n\
             Run: pcap2socks interfaces, then pcap2socks config set-interface <NAME>"
        )
    )]
    InterfaceMissing { interface: String },

    #[error("No network interfaces found")]
    #[diagnostic(
        code(pcap2socks::no_interfaces),
        help("The backend found no capture-capable interface on this machine.")
    )]
    NoInterfaces,

    #[error("{path} does not contain a valid proxy configuration")]
    #[diagnostic(
        code(pcap2socks::invalid_proxy_file),
        help("Expected a file written by: pcap2socks config export")
    )]
    InvalidProxyFile { path: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pcap2socks::validation))]
    Validation { field: String, reason: String },

    // ── Settings ─────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(pcap2socks::config))]
    Config(Box<figment::Error>),

    #[error("Failed to write settings: {0}")]
    #[diagnostic(code(pcap2socks::config_write))]
    ConfigWrite(#[from] toml::ser::Error),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(pcap2socks::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Backend { .. } | Self::Protocol { .. } => exit_code::BACKEND,
            Self::NoSavedConfig { .. } | Self::InterfaceMissing { .. } | Self::NoInterfaces => {
                exit_code::NOT_FOUND
            }
            Self::Validation { .. }
            | Self::InvalidProxyFile { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Upstream error mapping ───────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Backend { command, message } => Self::Backend { command, message },
            CoreError::UnexpectedResponse { command, actual } => Self::Protocol { command, actual },
            CoreError::InvalidConfig { slot } => Self::NoSavedConfig { slot },
            CoreError::Busy => Self::Internal("another operation is in progress".into()),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::InvalidProxy { path } => Self::InvalidProxyFile {
                path: path.display().to_string(),
            },
            ConfigError::Serialization(e) => Self::ConfigWrite(e),
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}
