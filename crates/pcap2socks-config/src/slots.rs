// On-disk slot storage and proxy file exchange.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pcap2socks_core::{EXPORT_FILE_NAME, Proxy, Record, SlotStore};

use crate::ConfigError;

/// Slot store keeping each slot as `<dir>/<slot>.json`.
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl SlotStore for FileSlots {
    type Error = std::io::Error;

    fn read(&self, slot: &str) -> Result<Option<String>, Self::Error> {
        match std::fs::read_to_string(self.path(slot)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, slot: &str, text: &str) -> Result<(), Self::Error> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(slot), text)
    }

    fn remove(&self, slot: &str) -> Result<(), Self::Error> {
        match std::fs::remove_file(self.path(slot)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Write `proxy` to `<dir>/pcap2socks.json`. Invalid proxies are refused.
pub fn export_proxy(dir: &Path, proxy: &Proxy) -> Result<PathBuf, ConfigError> {
    if !proxy.validate() {
        return Err(ConfigError::Validation {
            field: "proxy".into(),
            reason: "destination is empty".into(),
        });
    }
    std::fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    std::fs::write(&path, proxy.to_json_pretty())?;
    tracing::debug!(path = %path.display(), "exported proxy");
    Ok(path)
}

/// Read a proxy previously written by [`export_proxy`].
pub fn import_proxy(path: &Path) -> Result<Proxy, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Proxy::parse(&text).ok_or_else(|| ConfigError::InvalidProxy {
        path: path.to_path_buf(),
    })
}
