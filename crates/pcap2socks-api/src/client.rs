// Backend HTTP client
//
// Posts each command as a JSON document to the backend's invoke endpoint and
// unwraps the `{ "ok": ... }` / `{ "error": "..." }` reply envelope.

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::backend::Backend;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{Request, Response};

/// Raw HTTP client for the pcap2socks backend.
pub struct HttpBackend {
    http: reqwest::Client,
    endpoint: Url,
    timeout_secs: u64,
}

impl HttpBackend {
    /// Create a backend client posting to `endpoint`
    /// (e.g. `http://127.0.0.1:7171/invoke`).
    pub fn new(endpoint: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            endpoint,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a backend client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(endpoint: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            timeout_secs: 0,
        })
    }

    /// The endpoint commands are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, request: &Request) -> Result<Value, Error> {
        debug!(cmd = %request.command(), "POST {}", self.endpoint);

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    Error::Transport(e)
                }
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        let envelope = serde_json::from_str::<Map<String, Value>>(&body).ok();

        if !status.is_success() {
            // Handled failures still arrive inside the envelope.
            if let Some(message) = envelope.as_ref().and_then(error_message) {
                return Err(Error::Backend { message });
            }
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let Some(mut envelope) = envelope else {
            return Err(Error::Deserialization {
                message: "reply is not a JSON object".into(),
                body,
            });
        };

        if let Some(message) = error_message(&envelope) {
            return Err(Error::Backend { message });
        }
        envelope.remove("ok").ok_or_else(|| Error::Deserialization {
            message: "reply carries neither `ok` nor `error`".into(),
            body,
        })
    }
}

/// Extract the `{ "error": "..." }` message from a reply envelope.
fn error_message(envelope: &Map<String, Value>) -> Option<String> {
    match envelope.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl Backend for HttpBackend {
    async fn invoke(&self, request: Request) -> Result<Response, Error> {
        let command = request.command();
        let value = self.post(&request).await?;
        Response::decode(command, value)
    }
}
