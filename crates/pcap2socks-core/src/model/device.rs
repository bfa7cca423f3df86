use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter};

use super::{Record, integral, number_field, object, string_field};

/// Address template for the redirected device.
///
/// Non-custom presets mirror the virtual networks third-party game
/// accelerators configure, so a console set up for one of them needs no
/// changes. The backend resolves their addresses; `source`/`publish` are only
/// read for [`Preset::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Preset {
    #[strum(to_string = "Custom")]
    Custom,
    #[default]
    #[strum(to_string = "Tencent game accelerator")]
    TencentAccelerator,
    #[strum(to_string = "NetEase UU accelerator")]
    NeteaseUu,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Self::Custom, Self::TencentAccelerator, Self::NeteaseUu];

    pub fn value(self) -> u8 {
        match self {
            Self::Custom => 0,
            Self::TencentAccelerator => 1,
            Self::NeteaseUu => 2,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Custom),
            1 => Some(Self::TencentAccelerator),
            2 => Some(Self::NeteaseUu),
            _ => None,
        }
    }

    /// One-line summary of the addresses the backend will use.
    pub fn description(self) -> &'static str {
        match self {
            Self::Custom => "Enter the source address and optional virtual gateway",
            Self::TencentAccelerator => "Source 10.6.0.1, gateway 10.6.0.2",
            Self::NeteaseUu => "Source and gateway in 172.24.0.0/16, derived from the interface",
        }
    }
}

/// The device (or network) whose traffic is redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub preset: u8,
    /// IP or CIDR of the device(s) to redirect.
    pub source: String,
    /// Virtual gateway address; empty for none.
    pub publish: String,
}

impl Device {
    pub fn new(preset: u8, source: impl Into<String>, publish: impl Into<String>) -> Self {
        Self {
            preset,
            source: source.into(),
            publish: publish.into(),
        }
    }

    pub fn preset(&self) -> Option<Preset> {
        Preset::from_value(self.preset)
    }
}

impl Record for Device {
    const SLOT: &'static str = "device";

    fn validate(&self) -> bool {
        self.preset().is_some() && !self.source.is_empty()
    }

    fn from_untyped(value: &Value) -> Option<Self> {
        let obj = object(value)?;
        let preset = number_field(obj, "preset")?;
        let source = string_field(obj, "source")?;
        let publish = string_field(obj, "publish")?;
        let preset = u8::try_from(integral(preset)?).ok()?;
        Self::new(preset, source, publish).checked()
    }
}
