//! `pcap2socks-tui`: terminal setup wizard and live dashboard for pcap2socks.
//!
//! Walks through picking a capture interface, describing the redirected
//! device and pointing at a SOCKS proxy, then runs the engine and shows its
//! traffic. The saved configuration is shared with the `pcap2socks` CLI.
//!
//! Logs go to a file (default `/tmp/pcap2socks-tui.log`) so they never
//! corrupt the terminal UI.

mod action;
mod app;
mod component;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use pcap2socks_api::{HttpBackend, TransportConfig};
use pcap2socks_core::Session;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::screens::StartupInfo;

/// Terminal wizard for redirecting a device's traffic through a SOCKS proxy.
#[derive(Parser, Debug)]
#[command(name = "pcap2socks-tui", version, about)]
struct Cli {
    /// Backend endpoint URL (overrides backend.endpoint in the settings file)
    #[arg(short, long, env = "PCAP2SOCKS_ENDPOINT")]
    endpoint: Option<String>,

    /// Directory holding the saved configuration
    #[arg(long, env = "PCAP2SOCKS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory pcap2socks.json is imported from and exported to
    #[arg(long, default_value = ".")]
    exchange_dir: PathBuf,

    /// Log file path
    #[arg(long, default_value = "/tmp/pcap2socks-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may be logged to stdout or stderr while the
/// terminal is in raw mode. Hold the guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pcap2socks_tui={level},pcap2socks_core={level},pcap2socks_api={level}"
        ))
    });

    let dir = cli.log_file.parent().unwrap_or(Path::new("/tmp"));
    let file_name = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("pcap2socks-tui.log"));
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let mut settings = pcap2socks_config::load_settings_or_default();
    if let Some(endpoint) = &cli.endpoint {
        settings.backend.endpoint.clone_from(endpoint);
    }
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = Some(dir.clone());
    }

    let endpoint = settings.endpoint_url()?;
    let transport = TransportConfig::default().with_timeout(settings.timeout());
    let backend = HttpBackend::new(endpoint, &transport)?;
    info!(endpoint = %backend.endpoint(), "starting pcap2socks-tui");

    let info = StartupInfo {
        endpoint: backend.endpoint().to_string(),
        data_dir: settings.data_dir(),
        exchange_dir: cli.exchange_dir.clone(),
    };
    let (session, status_rx) = Session::new(backend, settings.status_interval());
    let mut app = App::new(session, status_rx, settings.slots(), cli.exchange_dir, info);
    app.run().await
}
