use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Record, integral, number_field, object, string_field};

/// Smallest MTU every IPv4 host must accept.
pub const MTU_MIN: u32 = 576;
/// Largest MTU; Ethernet payload size.
pub const MTU_MAX: u32 = 1500;

/// The capture interface and the MTU to run the engine with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Backend-reported device identifier.
    pub interface: String,
    pub mtu: u32,
}

impl Interface {
    pub fn new(interface: impl Into<String>, mtu: u32) -> Self {
        Self {
            interface: interface.into(),
            mtu,
        }
    }
}

impl Record for Interface {
    const SLOT: &'static str = "interface";

    fn validate(&self) -> bool {
        !self.interface.is_empty() && (MTU_MIN..=MTU_MAX).contains(&self.mtu)
    }

    fn from_untyped(value: &Value) -> Option<Self> {
        let obj = object(value)?;
        let interface = string_field(obj, "interface")?;
        let mtu = number_field(obj, "mtu")?;
        // A number of the wrong kind passes the type check but can never
        // validate: fractional or out of range.
        let mtu = u32::try_from(integral(mtu)?).ok()?;
        Self::new(interface, mtu).checked()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn mtu_bounds_are_inclusive() {
        let at = |mtu: u32| Interface::from_untyped(&json!({ "interface": "eth0", "mtu": mtu }));
        assert!(at(575).is_none());
        assert!(at(576).is_some());
        assert_eq!(at(1500), Some(Interface::new("eth0", 1500)));
        assert!(at(1501).is_none());
    }

    #[test]
    fn fractional_and_negative_mtu_rejected() {
        assert!(Interface::from_untyped(&json!({ "interface": "eth0", "mtu": 900.5 })).is_none());
        assert!(Interface::from_untyped(&json!({ "interface": "eth0", "mtu": -1400 })).is_none());
        assert_eq!(
            Interface::from_untyped(&json!({ "interface": "eth0", "mtu": 1400.0 })),
            Some(Interface::new("eth0", 1400))
        );
    }

    #[test]
    fn mistyped_fields_rejected() {
        assert!(Interface::from_untyped(&json!({ "interface": "eth0", "mtu": "1400" })).is_none());
        assert!(Interface::from_untyped(&json!({ "interface": 7, "mtu": 1400 })).is_none());
        assert!(Interface::from_untyped(&json!({ "mtu": 1400 })).is_none());
        assert!(Interface::from_untyped(&json!([1, 2])).is_none());
    }

    #[test]
    fn empty_name_rejected() {
        assert!(!Interface::new("", 1400).validate());
        assert!(Interface::from_untyped(&json!({ "interface": "", "mtu": 1400 })).is_none());
    }

    #[test]
    fn serializes_pretty_in_field_order() {
        insta::assert_snapshot!(Interface::new("eth0", 1400).to_json_pretty(), @r#"
        {
          "interface": "eth0",
          "mtu": 1400
        }
        "#);
    }

    #[test]
    fn round_trips_across_valid_range() {
        for name in ["eth0", "\\Device\\NPF_{3F2504E0}", "en0 (Wi-Fi)"] {
            for mtu in [MTU_MIN, 1000, 1492, MTU_MAX] {
                let inter = Interface::new(name, mtu);
                assert_eq!(Interface::parse(&inter.to_json_pretty()), Some(inter));
            }
        }
    }

    #[test]
    fn garbage_text_is_absent() {
        assert!(Interface::parse("{not json").is_none());
        assert!(Interface::parse("").is_none());
        assert!(Interface::parse("null").is_none());
    }
}
