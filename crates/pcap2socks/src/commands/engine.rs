//! Engine control: run, stop, test and status.

use pcap2socks_api::{RunResponse, StatusResponse, TestResponse};
use pcap2socks_config::import_proxy;
use pcap2socks_core::form::test_payload;
use pcap2socks_core::{Proxy, STATUS_INTERVAL, StatusUpdate, Telemetry, convert};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::{GlobalOpts, OutputFormat, RunArgs, TestArgs};
use crate::config::{self, CliSession};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Detail views ────────────────────────────────────────────────────

fn run_detail(resp: &RunResponse, fallback_mtu: u32) -> String {
    let mut rows = vec![
        ("NAT type", resp.nat.to_string()),
        ("Device IP", resp.src_ip.clone()),
        ("Subnet mask", resp.mask.clone()),
        ("Gateway", resp.gateway.clone()),
        ("MTU", resp.mtu.unwrap_or(fallback_mtu).to_string()),
    ];
    if let Some(remote) = &resp.remote_ip {
        rows.insert(1, ("Proxy IP", remote.clone()));
    }
    output::detail_lines(&rows)
}

fn test_detail(resp: &TestResponse) -> String {
    output::detail_lines(&[
        ("NAT type", resp.nat.to_string()),
        ("External IP", resp.ip.clone().unwrap_or_else(|| "-".into())),
    ])
}

fn status_detail(status: &StatusResponse, color: bool) -> String {
    let t = Telemetry::default().apply(status, STATUS_INTERVAL);
    let mut rows = vec![
        ("Running", if status.run { "yes" } else { "no" }.to_owned()),
        ("Latency", output::paint_latency(&convert::latency(t.latency), color)),
        ("Download", convert::byte_rate(t.download).to_string()),
        ("Upload", convert::byte_rate(t.upload).to_string()),
        ("Download packets", convert::packet_rate(t.download_count).to_string()),
        ("Upload packets", convert::packet_rate(t.upload_count).to_string()),
    ];
    if status.download_total.is_some() || status.upload_total.is_some() {
        rows.push(("Downloaded", convert::byte_total(t.download_total).to_string()));
        rows.push(("Uploaded", convert::byte_total(t.upload_total).to_string()));
    }
    output::detail_lines(&rows)
}

/// One line per status report while watching.
fn watch_line(t: &Telemetry, color: bool) -> String {
    let label = |s: &str| output::paint_label(s, color);
    format!(
        "{}  {} {}  {} {}  {} {}  {} {}",
        chrono::Local::now().format("%H:%M:%S"),
        label("elapsed"),
        convert::format_duration(t.elapsed),
        label("latency"),
        output::paint_latency(&convert::latency(t.latency), color),
        label("down"),
        convert::byte_rate(t.download),
        label("up"),
        convert::byte_rate(t.upload),
    )
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn run(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve_settings(global)?;
    let profile = util::load_profile(&settings.slots())?;
    let (mut session, mut status_rx) = config::connect(&settings)?;

    let interfaces = session.list_interfaces().await?;
    if !interfaces
        .iter()
        .any(|i| i.name == profile.interface.interface)
    {
        return Err(CliError::InterfaceMissing {
            interface: profile.interface.interface,
        });
    }

    let pb = output::spinner("Starting pcap2socks", global.quiet);
    let result = session.run(profile.run_payload()).await;
    pb.finish_and_clear();
    let resp = result?;

    let out = output::render_single(
        &global.output,
        &resp,
        |r| run_detail(r, profile.interface.mtu),
        |r| r.src_ip.clone(),
    );
    output::print_output(&out, global.quiet);
    if !global.quiet && matches!(global.output, OutputFormat::Table) {
        eprintln!("\nConfigure the redirected device with the network settings above.");
    }

    if args.watch {
        watch(&mut session, &mut status_rx, global).await?;
    }
    Ok(())
}

async fn watch(
    session: &mut CliSession,
    status_rx: &mut UnboundedReceiver<StatusUpdate>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());
    if !global.quiet {
        eprintln!("Watching status; press Ctrl-C to stop.");
    }

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            update = status_rx.recv() => match update {
                Some(Ok(status)) => {
                    let telemetry = session.receive_status(status).telemetry;
                    let line = if matches!(global.output, OutputFormat::Table) {
                        watch_line(&telemetry, color)
                    } else {
                        output::render_json(&status, true)
                    };
                    output::print_output(&line, global.quiet);
                }
                Some(Err(e)) => tracing::warn!(error = %e, "status query failed"),
                None => break,
            },
        }
    }

    let pb = output::spinner("Stopping pcap2socks", global.quiet);
    let result = session.stop().await;
    pb.finish_and_clear();
    result?;
    if !global.quiet {
        eprintln!("Stopped");
    }
    Ok(())
}

pub async fn stop(global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve_settings(global)?;
    let (session, _status) = config::connect(&settings)?;

    let pb = output::spinner("Stopping pcap2socks", global.quiet);
    let result = session.gateway().stop().await;
    pb.finish_and_clear();
    result?;
    if !global.quiet {
        eprintln!("Stopped");
    }
    Ok(())
}

pub async fn test(args: TestArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve_settings(global)?;
    let proxy: Proxy = match &args.file {
        Some(path) => import_proxy(path)?,
        None => util::load_record(&settings.slots())?,
    };
    let (mut session, _status) = config::connect(&settings)?;

    let pb = output::spinner(&format!("Testing {}", proxy.destination), global.quiet);
    let result = session.test(test_payload(&proxy)).await;
    pb.finish_and_clear();
    let resp = result?;

    let out = output::render_single(&global.output, &resp, test_detail, |r| r.nat.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn status(global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve_settings(global)?;
    let (session, _status) = config::connect(&settings)?;
    let status = session.gateway().status().await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &status,
        |s| status_detail(s, color),
        |s| s.run.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use pcap2socks_api::NatType;

    use super::*;

    fn status() -> StatusResponse {
        StatusResponse {
            run: true,
            latency: 2500,
            upload: 500,
            upload_count: 2,
            download: 2_000_000,
            download_count: 1500,
            upload_total: None,
            upload_total_count: None,
            download_total: None,
            download_total_count: None,
        }
    }

    #[test]
    fn status_detail_uses_display_units() {
        insta::assert_snapshot!(status_detail(&status(), false), @r"
        Running           yes
        Latency           ∞
        Download          1.91 MB/s
        Upload            500.00 B/s
        Download packets  1.46 kp/s
        Upload packets    2.00 p/s
        ");
    }

    #[test]
    fn run_detail_prefers_backend_mtu() {
        let resp = RunResponse {
            nat: NatType::B,
            remote_ip: None,
            src_ip: "10.6.0.1".into(),
            mask: "255.255.255.0".into(),
            gateway: "10.6.0.2".into(),
            mtu: None,
        };
        let text = run_detail(&resp, 1400);
        assert!(text.contains("NAT type     B"));
        assert!(text.ends_with("MTU          1400"));
    }
}
