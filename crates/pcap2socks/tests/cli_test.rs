//! Integration tests for the `pcap2socks` CLI binary.
//!
//! Argument parsing, saved configuration and backend round trips, with
//! settings isolated from the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `pcap2socks` binary with env isolation.
///
/// Clears all `PCAP2SOCKS_*` env vars, points config directories at a
/// nonexistent path and keeps saved records inside `data_dir`.
fn pcap2socks_cmd(data_dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("pcap2socks");
    cmd.env("HOME", "/tmp/pcap2socks-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/pcap2socks-cli-test-nonexistent")
        .env_remove("PCAP2SOCKS_ENDPOINT")
        .env_remove("PCAP2SOCKS_OUTPUT")
        .env_remove("PCAP2SOCKS_TIMEOUT")
        .env_remove("PCAP2SOCKS_STATUS_INTERVAL_MS")
        .env("PCAP2SOCKS_DATA_DIR", data_dir);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a command off the async runtime so the mock server keeps serving.
async fn output_of(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn save_profile(dir: &Path) {
    pcap2socks_cmd(dir)
        .args(["config", "set-interface", "eth0", "--mtu", "1400"])
        .assert()
        .success();
    pcap2socks_cmd(dir)
        .args(["config", "set-device"])
        .assert()
        .success();
    pcap2socks_cmd(dir)
        .args(["config", "set-proxy", "127.0.0.1:1080"])
        .assert()
        .success();
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = pcap2socks_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let dir = tempfile::tempdir().unwrap();
    pcap2socks_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("SOCKS proxy")
            .and(predicate::str::contains("interfaces"))
            .and(predicate::str::contains("run"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    pcap2socks_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pcap2socks"));
}

#[test]
fn test_invalid_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    pcap2socks_cmd(dir.path())
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    pcap2socks_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pcap2socks"));
}

// ── Saved configuration ─────────────────────────────────────────────

#[test]
fn test_set_interface_writes_slot() {
    let dir = tempfile::tempdir().unwrap();
    pcap2socks_cmd(dir.path())
        .args(["config", "set-interface", "eth0", "--mtu", "1400"])
        .assert()
        .success();

    let text = std::fs::read_to_string(dir.path().join("interface.json")).unwrap();
    let saved: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(saved, json!({ "interface": "eth0", "mtu": 1400 }));
}

#[test]
fn test_set_interface_rejects_out_of_range_mtu() {
    let dir = tempfile::tempdir().unwrap();
    let output = pcap2socks_cmd(dir.path())
        .args(["config", "set-interface", "eth0", "--mtu", "9000"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.path().join("interface.json").exists());
}

#[test]
fn test_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();
    pcap2socks_cmd(dir.path())
        .args([
            "config",
            "set-proxy",
            "proxy.example:1080",
            "-u",
            "alice",
            "--password",
            "hunter2",
        ])
        .assert()
        .success();

    let output = pcap2socks_cmd(dir.path())
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let view: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["proxy"]["username"], "alice");
    assert_eq!(view["proxy"]["password"], "****");
    assert_eq!(view["proxy"]["authentication"], true);
    assert_eq!(view["interface"], Value::Null);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("hunter2"));
}

#[test]
fn test_set_proxy_keeps_flag_like_extra() {
    let dir = tempfile::tempdir().unwrap();
    pcap2socks_cmd(dir.path())
        .args([
            "config",
            "set-proxy",
            "10.0.0.9:1080",
            "--extra",
            "--verbose --no-arp",
        ])
        .assert()
        .success();

    let text = std::fs::read_to_string(dir.path().join("proxy.json")).unwrap();
    let saved: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(saved["extra"], "--verbose --no-arp");
}

#[test]
fn test_export_then_import_proxy() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    pcap2socks_cmd(source.path())
        .args(["config", "set-proxy", "10.0.0.9:1080", "--extra", "-v"])
        .assert()
        .success();
    pcap2socks_cmd(source.path())
        .args(["config", "export", "--dir"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("pcap2socks.json"));

    pcap2socks_cmd(target.path())
        .args(["config", "import"])
        .arg(out.path().join("pcap2socks.json"))
        .assert()
        .success();

    let text = std::fs::read_to_string(target.path().join("proxy.json")).unwrap();
    let imported: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(imported["destination"], "10.0.0.9:1080");
    assert_eq!(imported["extra"], "-v");
}

#[test]
fn test_import_rejects_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.json");
    std::fs::write(&file, r#"{ "destination": 42 }"#).unwrap();

    let output = pcap2socks_cmd(dir.path())
        .args(["config", "import"])
        .arg(&file)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("valid proxy configuration"),
        "Expected invalid proxy error:\n{text}"
    );
}

#[test]
fn test_clear_requires_yes_when_not_interactive() {
    let dir = tempfile::tempdir().unwrap();
    save_profile(dir.path());

    pcap2socks_cmd(dir.path())
        .args(["config", "clear"])
        .assert()
        .failure()
        .code(2);
    assert!(dir.path().join("proxy.json").exists());

    pcap2socks_cmd(dir.path())
        .args(["--yes", "config", "clear"])
        .assert()
        .success();
    assert!(!dir.path().join("proxy.json").exists());
    assert!(!dir.path().join("interface.json").exists());
}

#[test]
fn test_run_without_saved_config() {
    let dir = tempfile::tempdir().unwrap();
    let output = pcap2socks_cmd(dir.path()).arg("run").output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(
        text.contains("No valid saved interface configuration"),
        "Expected missing config error:\n{text}"
    );
}

// ── Backend round trips ─────────────────────────────────────────────

async fn backend() -> MockServer {
    MockServer::start().await
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/invoke", server.uri())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_interfaces_json() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "cmd": "listInterfaces" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": [{ "name": "eth0", "alias": "Ethernet", "mtu": 1500 }]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cmd = pcap2socks_cmd(dir.path());
    cmd.args(["-o", "json", "interfaces"])
        .env("PCAP2SOCKS_ENDPOINT", endpoint(&server));
    let output = output_of(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let listed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["name"], "eth0");
    assert_eq!(listed[0]["mtu"], 1500);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backend_error_message_surfaces() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "pcap is not installed" })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cmd = pcap2socks_cmd(dir.path());
    cmd.arg("stop").env("PCAP2SOCKS_ENDPOINT", endpoint(&server));
    let output = output_of(cmd).await;

    assert_eq!(output.status.code(), Some(7));
    let text = combined_output(&output);
    assert!(
        text.contains("pcap is not installed"),
        "Expected backend message:\n{text}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_table_uses_display_units() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "cmd": "getStatus" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": {
                "run": true,
                "latency": 42,
                "upload": 2048,
                "upload_count": 3,
                "download": 2_000_000,
                "download_count": 1500
            }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cmd = pcap2socks_cmd(dir.path());
    cmd.args(["--color", "never", "status"])
        .env("PCAP2SOCKS_ENDPOINT", endpoint(&server));
    let output = output_of(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("42 ms"), "{text}");
    assert!(text.contains("1.91 MB/s"), "{text}");
    assert!(text.contains("2.00 kB/s"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_refuses_missing_interface() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "cmd": "listInterfaces" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": [{ "name": "wlan0", "mtu": 1500 }]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    save_profile(dir.path());
    let mut cmd = pcap2socks_cmd(dir.path());
    cmd.arg("run").env("PCAP2SOCKS_ENDPOINT", endpoint(&server));
    let output = output_of(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("'eth0'"), "Expected interface name:\n{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_prints_network_settings() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "cmd": "listInterfaces" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": [{ "name": "eth0", "mtu": 1500 }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({
            "cmd": "run",
            "payload": {
                "interface": "eth0",
                "mtu": 1400,
                "preset": 1,
                "source": "10.6.0.1",
                "publish": "10.6.0.2",
                "destination": "127.0.0.1:1080",
                "authentication": false,
                "username": "",
                "password": "",
                "extra": ""
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": {
                "nat": "A",
                "src_ip": "10.6.0.1",
                "mask": "255.255.255.0",
                "gateway": "10.6.0.2"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    save_profile(dir.path());
    let mut cmd = pcap2socks_cmd(dir.path());
    cmd.args(["-o", "plain", "run"])
        .env("PCAP2SOCKS_ENDPOINT", endpoint(&server));
    let output = output_of(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "10.6.0.1");
}
