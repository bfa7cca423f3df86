//! Shared helpers for command handlers.

use std::io::IsTerminal;

use pcap2socks_config::FileSlots;
use pcap2socks_core::model;
use pcap2socks_core::{Device, Interface, Profile, Proxy, Record};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Load a saved record, naming the slot when it is absent or invalid.
pub fn load_record<R: Record>(slots: &FileSlots) -> Result<R, CliError> {
    model::load(slots).ok_or(CliError::NoSavedConfig { slot: R::SLOT })
}

/// Load all three saved records.
pub fn load_profile(slots: &FileSlots) -> Result<Profile, CliError> {
    Ok(Profile {
        interface: load_record::<Interface>(slots)?,
        device: load_record::<Device>(slots)?,
        proxy: load_record::<Proxy>(slots)?,
    })
}
