//! All UI actions. Actions are the sole mechanism for state mutation.

use pcap2socks_api::{InterfaceInfo, RunResponse, TestResponse};
use pcap2socks_core::{Form, Telemetry, wizard};

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A dismissible notice shown over the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, message)
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Footer ────────────────────────────────────────────────────
    Press(wizard::Action),

    // ── Form sync ─────────────────────────────────────────────────
    /// Saved or imported values to show in the inputs.
    LoadForm(Box<Form>),

    // ── Backend results ───────────────────────────────────────────
    InterfacesLoaded(Result<Vec<InterfaceInfo>, String>),
    RunFinished(Result<RunResponse, String>),
    StopFinished(Result<(), String>),
    TestFinished(Result<TestResponse, String>),

    // ── Running dashboard ─────────────────────────────────────────
    RunStarted(RunResponse),
    TelemetryUpdated(Telemetry),
    CycleDisplayMode,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
