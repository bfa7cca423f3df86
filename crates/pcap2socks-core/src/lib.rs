//! Front-end logic shared by the pcap2socks CLI and TUI.
//!
//! - **[`model`]**: the `Interface`, `Device` and `Proxy` configuration
//!   records, their untyped-input validation and slot persistence
//!   ([`Record`], [`SlotStore`]).
//! - **[`wizard`]**: the setup flow as a pure reducer over [`Wizard`] state,
//!   emitting [`Effect`]s instead of performing them.
//! - **[`Session`]**: owns the wizard, a [`Gateway`] over any
//!   [`pcap2socks_api::Backend`], and the [`StatusPoller`] that runs while
//!   the engine does.
//! - **[`convert`]**: display formatting for durations, latency and traffic.

pub mod convert;
pub mod error;
pub mod form;
pub mod gateway;
pub mod model;
pub mod poller;
pub mod session;
pub mod wizard;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use form::{Form, Profile, Restored};
pub use gateway::Gateway;
pub use model::{
    Device, EXPORT_FILE_NAME, EXPORT_MIME_TYPE, Interface, Preset, Proxy, Record, SlotStore,
};
pub use poller::{StatusPoller, StatusUpdate};
pub use session::{STATUS_INTERVAL, Session};
pub use wizard::{Action, Effect, Event, Op, Stage, Telemetry, Wizard};
