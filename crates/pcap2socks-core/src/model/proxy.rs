use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Record, bool_field, object, string_field};

/// File name proxy settings are exported under.
pub const EXPORT_FILE_NAME: &str = "pcap2socks.json";
/// Media type of an exported proxy file.
pub const EXPORT_MIME_TYPE: &str = "application/json";

/// Upstream SOCKS proxy settings.
///
/// Credentials are not required to be non-empty when `authentication` is
/// set; blank-password proxies exist.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    /// `host:port` of the proxy.
    pub destination: String,
    pub authentication: bool,
    pub username: String,
    pub password: String,
    /// Advanced options, passed to the backend untouched.
    pub extra: String,
}

impl Proxy {
    pub fn new(
        destination: impl Into<String>,
        authentication: bool,
        username: impl Into<String>,
        password: impl Into<String>,
        extra: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            authentication,
            username: username.into(),
            password: password.into(),
            extra: extra.into(),
        }
    }

    /// Proxy without credentials or extra options.
    pub fn anonymous(destination: impl Into<String>) -> Self {
        Self::new(destination, false, "", "", "")
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("destination", &self.destination)
            .field("authentication", &self.authentication)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("extra", &self.extra)
            .finish()
    }
}

impl Record for Proxy {
    const SLOT: &'static str = "proxy";

    fn validate(&self) -> bool {
        !self.destination.is_empty()
    }

    fn from_untyped(value: &Value) -> Option<Self> {
        let obj = object(value)?;
        Self::new(
            string_field(obj, "destination")?,
            bool_field(obj, "authentication")?,
            string_field(obj, "username")?,
            string_field(obj, "password")?,
            string_field(obj, "extra")?,
        )
        .checked()
    }
}
