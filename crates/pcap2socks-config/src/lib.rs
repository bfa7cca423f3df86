//! Shared configuration for the pcap2socks CLI and TUI.
//!
//! TOML settings layered with environment overrides, plus the on-disk
//! storage for the wizard's saved configuration slots and proxy
//! export/import files.

pub mod slots;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use slots::{FileSlots, export_proxy, import_proxy};

/// Default backend invoke endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7171/invoke";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{} does not contain a valid proxy configuration", path.display())]
    InvalidProxy { path: PathBuf },

    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Top-level TOML settings shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,

    /// Status polling period while running.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,

    /// Where saved configuration slots live. Defaults to the platform data
    /// directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            status_interval_ms: default_status_interval_ms(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_status_interval_ms() -> u64 {
    1000
}

impl Settings {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.backend.endpoint).map_err(|e| ConfigError::Validation {
            field: "backend.endpoint".into(),
            reason: e.to_string(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Polling period, never shorter than 100 ms.
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms.max(100))
    }

    /// Directory holding the saved configuration slots.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn slots(&self) -> FileSlots {
        FileSlots::new(self.data_dir())
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "pcap2socks")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.extend(parts);
    p
}

/// Resolve the settings file path via XDG / platform conventions.
pub fn settings_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".config", "pcap2socks", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn default_data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".local", "share", "pcap2socks"]),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from defaults, the settings file and `PCAP2SOCKS_*`
/// environment variables, in increasing precedence.
///
/// Nested keys use a double underscore: `PCAP2SOCKS_BACKEND__ENDPOINT`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PCAP2SOCKS_").split("__"));

    Ok(figment.extract()?)
}

/// Load settings, falling back to defaults when loading fails.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default settings");
        Settings::default()
    })
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize settings to TOML at the canonical settings path.
pub fn save_settings(settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = settings_path();
    save_settings_to(&path, settings)?;
    Ok(path)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
