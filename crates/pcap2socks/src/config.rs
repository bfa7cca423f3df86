//! Settings resolution with CLI flag overrides.

use pcap2socks_api::{HttpBackend, TransportConfig};
use pcap2socks_config::Settings;
use pcap2socks_core::{Session, StatusUpdate};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A backend session for the resolved endpoint.
pub type CliSession = Session<HttpBackend>;

/// Settings from file and environment, with `--endpoint`, `--timeout` and
/// `--data-dir` applied on top.
pub fn resolve_settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    let mut settings = pcap2socks_config::load_settings()?;
    if let Some(endpoint) = &global.endpoint {
        settings.backend.endpoint.clone_from(endpoint);
    }
    if let Some(timeout) = global.timeout {
        settings.backend.timeout_secs = timeout;
    }
    if let Some(dir) = &global.data_dir {
        settings.data_dir = Some(dir.clone());
    }
    Ok(settings)
}

pub fn connect(
    settings: &Settings,
) -> Result<(CliSession, UnboundedReceiver<StatusUpdate>), CliError> {
    let endpoint = settings.endpoint_url()?;
    let transport = TransportConfig::default().with_timeout(settings.timeout());
    let backend = HttpBackend::new(endpoint, &transport).map_err(|e| CliError::Validation {
        field: "endpoint".into(),
        reason: e.to_string(),
    })?;
    tracing::debug!(endpoint = %backend.endpoint(), "using backend");
    Ok(Session::new(backend, settings.status_interval()))
}
