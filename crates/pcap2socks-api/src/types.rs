// Backend command schemas
//
// One request variant per backend command, serialized as the tagged
// `{ "cmd": "...", "payload": { ... } }` object the backend expects, and one
// typed response per command. Responses are decoded against the command that
// produced them so a payload of the wrong shape never reaches a caller.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

// ── Commands ─────────────────────────────────────────────────────────

/// The backend's command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ListInterfaces,
    Run,
    Stop,
    Test,
    GetStatus,
}

impl Command {
    /// Wire name, as carried in the `cmd` tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListInterfaces => "listInterfaces",
            Self::Run => "run",
            Self::Stop => "stop",
            Self::Test => "test",
            Self::GetStatus => "getStatus",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Requests ─────────────────────────────────────────────────────────

/// Merged interface, device and proxy settings sent with `run`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPayload {
    pub interface: String,
    pub mtu: u32,
    pub preset: u8,
    pub source: String,
    pub publish: String,
    pub destination: String,
    pub authentication: bool,
    pub username: String,
    pub password: String,
    pub extra: String,
}

/// Proxy settings sent with `test`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPayload {
    pub destination: String,
    pub authentication: bool,
    pub username: String,
    pub password: String,
    pub extra: String,
}

impl fmt::Debug for RunPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunPayload")
            .field("interface", &self.interface)
            .field("mtu", &self.mtu)
            .field("preset", &self.preset)
            .field("source", &self.source)
            .field("publish", &self.publish)
            .field("destination", &self.destination)
            .field("authentication", &self.authentication)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("extra", &self.extra)
            .finish()
    }
}

impl fmt::Debug for TestPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestPayload")
            .field("destination", &self.destination)
            .field("authentication", &self.authentication)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("extra", &self.extra)
            .finish()
    }
}

/// A single backend invocation.
///
/// ```json
/// { "cmd": "run", "payload": { "interface": "eth0", ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Request {
    ListInterfaces,
    Run { payload: RunPayload },
    Stop,
    Test { payload: TestPayload },
    GetStatus,
}

impl Request {
    pub fn command(&self) -> Command {
        match self {
            Self::ListInterfaces => Command::ListInterfaces,
            Self::Run { .. } => Command::Run,
            Self::Stop => Command::Stop,
            Self::Test { .. } => Command::Test,
            Self::GetStatus => Command::GetStatus,
        }
    }
}

// ── Responses ────────────────────────────────────────────────────────

/// A capture-capable network interface reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub mtu: u32,
}

impl InterfaceInfo {
    /// Alias when the backend knows one, otherwise the raw device name.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// NAT behaviour classification of the upstream proxy, `A` being the most
/// permissive. Values the backend reports outside `A`..`F` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NatType {
    A,
    B,
    C,
    D,
    E,
    F,
    Unknown(String),
}

impl From<String> for NatType {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "A" => Self::A,
            "B" => Self::B,
            "C" => Self::C,
            "D" => Self::D,
            "E" => Self::E,
            "F" => Self::F,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<NatType> for String {
    fn from(nat: NatType) -> Self {
        nat.to_string()
    }
}

impl fmt::Display for NatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::Unknown(raw) => raw,
        };
        f.write_str(s)
    }
}

/// Result of a successful `run`: the negotiated NAT type and the virtual
/// network the redirected device should be configured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub nat: NatType,
    #[serde(default)]
    pub remote_ip: Option<String>,
    pub src_ip: String,
    pub mask: String,
    pub gateway: String,
    /// MTU the engine settled on, when the backend reports it.
    #[serde(default)]
    pub mtu: Option<u32>,
}

/// Result of a proxy `test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResponse {
    pub nat: NatType,
    /// External address the proxy exposes, when it could be observed.
    #[serde(default)]
    pub ip: Option<String>,
}

/// Instantaneous traffic counters. The backend resets the per-interval
/// counters on every read, so `upload`/`download` are bytes in the last
/// interval and `*_count` are packets in the last interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub run: bool,
    /// Round-trip latency to the proxy in milliseconds.
    pub latency: u64,
    pub upload: u64,
    pub upload_count: u64,
    pub download: u64,
    pub download_count: u64,
    #[serde(default)]
    pub upload_total: Option<u64>,
    #[serde(default)]
    pub upload_total_count: Option<u64>,
    #[serde(default)]
    pub download_total: Option<u64>,
    #[serde(default)]
    pub download_total_count: Option<u64>,
}

/// A decoded backend result, one variant per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Interfaces(Vec<InterfaceInfo>),
    Run(RunResponse),
    Stopped,
    Test(TestResponse),
    Status(StatusResponse),
}

impl Response {
    /// Decode the raw result of `command`, checking it has that command's shape.
    pub fn decode(command: Command, value: Value) -> Result<Self, Error> {
        match command {
            Command::ListInterfaces => from_value(value).map(Self::Interfaces),
            Command::Run => from_value(value).map(Self::Run),
            Command::Stop => match value {
                Value::Null => Ok(Self::Stopped),
                Value::Object(ref map) if map.is_empty() => Ok(Self::Stopped),
                other => Err(Error::Deserialization {
                    message: "stop returns no payload".into(),
                    body: other.to_string(),
                }),
            },
            Command::Test => from_value(value).map(Self::Test),
            Command::GetStatus => from_value(value).map(Self::Status),
        }
    }

    /// The command this response answers.
    pub fn command(&self) -> Command {
        match self {
            Self::Interfaces(_) => Command::ListInterfaces,
            Self::Run(_) => Command::Run,
            Self::Stopped => Command::Stop,
            Self::Test(_) => Command::Test,
            Self::Status(_) => Command::GetStatus,
        }
    }
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    let body = value.to_string();
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn unit_commands_serialize_as_bare_tag() {
        assert_eq!(
            serde_json::to_value(Request::ListInterfaces).unwrap(),
            json!({ "cmd": "listInterfaces" })
        );
        assert_eq!(
            serde_json::to_value(Request::GetStatus).unwrap(),
            json!({ "cmd": "getStatus" })
        );
    }

    #[test]
    fn test_command_carries_proxy_payload() {
        let req = Request::Test {
            payload: TestPayload {
                destination: "localhost:1080".into(),
                authentication: true,
                username: "u".into(),
                password: "p".into(),
                extra: String::new(),
            },
        };
        insta::assert_json_snapshot!(req, @r#"
        {
          "cmd": "test",
          "payload": {
            "destination": "localhost:1080",
            "authentication": true,
            "username": "u",
            "password": "p",
            "extra": ""
          }
        }
        "#);
    }

    #[test]
    fn payload_debug_redacts_password() {
        let payload = TestPayload {
            destination: "proxy:1080".into(),
            authentication: true,
            username: "alice".into(),
            password: "hunter2".into(),
            extra: String::new(),
        };
        let dbg = format!("{payload:?}");
        assert!(dbg.contains("alice"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn nat_type_keeps_unknown_values() {
        let nat: NatType = serde_json::from_value(json!("C")).unwrap();
        assert_eq!(nat, NatType::C);
        let nat: NatType = serde_json::from_value(json!("Symmetric")).unwrap();
        assert_eq!(nat.to_string(), "Symmetric");
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let err = Response::decode(Command::GetStatus, json!([{ "name": "eth0", "mtu": 1500 }]))
            .unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));

        let err = Response::decode(Command::Stop, json!({ "run": true })).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn decode_status_without_totals() {
        let resp = Response::decode(
            Command::GetStatus,
            json!({
                "run": true,
                "latency": 42,
                "upload": 100,
                "upload_count": 2,
                "download": 2000,
                "download_count": 3
            }),
        )
        .unwrap();
        let Response::Status(status) = resp else {
            panic!("expected status");
        };
        assert_eq!(status.latency, 42);
        assert_eq!(status.download_total, None);
    }
}
