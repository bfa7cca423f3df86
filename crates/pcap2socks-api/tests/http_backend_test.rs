// Integration tests for `HttpBackend` using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pcap2socks_api::{
    Backend, Error, HttpBackend, InterfaceInfo, NatType, Request, Response, RunPayload,
    TestPayload,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HttpBackend) {
    let server = MockServer::start().await;
    let backend =
        HttpBackend::from_reqwest(&format!("{}/invoke", server.uri()), reqwest::Client::new())
            .unwrap();
    (server, backend)
}

fn run_payload() -> RunPayload {
    RunPayload {
        interface: "eth0".into(),
        mtu: 1400,
        preset: 1,
        source: "10.6.0.1".into(),
        publish: "10.6.0.2".into(),
        destination: "localhost:1080".into(),
        authentication: false,
        username: String::new(),
        password: String::new(),
        extra: String::new(),
    }
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_interfaces() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "cmd": "listInterfaces" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": [
                { "name": "eth0", "alias": "Ethernet", "mtu": 1500 },
                { "name": "wlan0", "mtu": 1480 }
            ]
        })))
        .mount(&server)
        .await;

    let resp = backend.invoke(Request::ListInterfaces).await.unwrap();

    assert_eq!(
        resp,
        Response::Interfaces(vec![
            InterfaceInfo {
                name: "eth0".into(),
                alias: Some("Ethernet".into()),
                mtu: 1500,
            },
            InterfaceInfo {
                name: "wlan0".into(),
                alias: None,
                mtu: 1480,
            },
        ])
    );
}

#[tokio::test]
async fn test_run_sends_merged_payload() {
    let (server, backend) = setup().await;

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
                "destination": "localhost:1080",
                "authentication": false,
                "username": "",
                "password": "",
                "extra": ""
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": {
                "nat": "A",
                "remote_ip": "203.0.113.7",
                "src_ip": "10.6.0.1",
                "mask": "255.255.255.0",
                "gateway": "10.6.0.254"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = backend
        .invoke(Request::Run {
            payload: run_payload(),
        })
        .await
        .unwrap();

    let Response::Run(run) = resp else {
        panic!("expected run response, got {resp:?}");
    };
    assert_eq!(run.nat, NatType::A);
    assert_eq!(run.remote_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(run.gateway, "10.6.0.254");
    assert_eq!(run.mtu, None);
}

#[tokio::test]
async fn test_stop_accepts_null_result() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "cmd": "stop" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": null })))
        .mount(&server)
        .await;

    let resp = backend.invoke(Request::Stop).await.unwrap();
    assert_eq!(resp, Response::Stopped);
}

#[tokio::test]
async fn test_proxy_test_reports_nat() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": { "nat": "D", "ip": "198.51.100.4" } })),
        )
        .mount(&server)
        .await;

    let resp = backend
        .invoke(Request::Test {
            payload: TestPayload {
                destination: "proxy.example:1080".into(),
                authentication: false,
                username: String::new(),
                password: String::new(),
                extra: String::new(),
            },
        })
        .await
        .unwrap();

    let Response::Test(test) = resp else {
        panic!("expected test response, got {resp:?}");
    };
    assert_eq!(test.nat, NatType::D);
    assert_eq!(test.ip.as_deref(), Some("198.51.100.4"));
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_backend_error_envelope() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "error": "cannot open device eth0" })),
        )
        .mount(&server)
        .await;

    let err = backend.invoke(Request::Stop).await.unwrap_err();
    assert_eq!(err.backend_message(), Some("cannot open device eth0"));
}

#[tokio::test]
async fn test_backend_error_on_failure_status() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "engine crashed" })),
        )
        .mount(&server)
        .await;

    let err = backend.invoke(Request::GetStatus).await.unwrap_err();
    assert!(matches!(err, Error::Backend { ref message } if message == "engine crashed"));
}

#[tokio::test]
async fn test_plain_http_error() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = backend.invoke(Request::GetStatus).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_mismatched_response_shape() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": { "nat": "A", "ip": null } })),
        )
        .mount(&server)
        .await;

    // A test-shaped reply to getStatus must not be accepted.
    let err = backend.invoke(Request::GetStatus).await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}

#[tokio::test]
async fn test_non_json_body() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = backend.invoke(Request::ListInterfaces).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("<html>")),
        other => panic!("expected deserialization error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let backend = HttpBackend::from_reqwest(&format!("{}/invoke", server.uri()), http).unwrap();

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": null }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = backend.invoke(Request::Stop).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert!(err.is_transient());
}
