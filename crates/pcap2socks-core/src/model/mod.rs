// ── Configuration records ──
//
// The three value objects the wizard collects. Each owns one persisted slot
// and the same untyped-input contract: every field present with the right
// JSON primitive type, then the record's own domain predicate. Anything that
// fails either check is reported as `None`, never as an error.

pub mod device;
pub mod interface;
pub mod proxy;

use serde::Serialize;
use serde_json::{Map, Number, Value};

pub use device::{Device, Preset};
pub use interface::Interface;
pub use proxy::{EXPORT_FILE_NAME, EXPORT_MIME_TYPE, Proxy};

// ── Record contract ─────────────────────────────────────────────────

/// Shared behaviour of `Interface`, `Device` and `Proxy`.
pub trait Record: Sized + Serialize {
    /// Name of the storage slot this record is persisted under.
    const SLOT: &'static str;

    /// Domain predicate. Pure; never fails.
    fn validate(&self) -> bool;

    /// Build a record from untyped data, or `None` if any field is missing,
    /// mistyped, or the result does not validate.
    fn from_untyped(value: &Value) -> Option<Self>;

    /// Decode JSON text and apply [`Record::from_untyped`]. Malformed JSON
    /// yields `None`.
    fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        Self::from_untyped(&value)
    }

    /// Two-space indented JSON of exactly this record's fields, in
    /// declaration order.
    fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).expect("record serialization should not fail")
    }

    /// Checked constructor: the record if it validates.
    fn checked(self) -> Option<Self> {
        self.validate().then_some(self)
    }
}

// ── Slot storage ────────────────────────────────────────────────────

/// Text key-value storage holding one slot per record type.
///
/// Implementations report I/O failures through their own error type; the
/// record helpers below treat an unreadable slot like an absent one.
pub trait SlotStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn read(&self, slot: &str) -> Result<Option<String>, Self::Error>;
    fn write(&self, slot: &str, text: &str) -> Result<(), Self::Error>;
    fn remove(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Load a record from its slot. Absent, unreadable or invalid contents all
/// mean "no saved configuration".
pub fn load<R: Record, S: SlotStore + ?Sized>(store: &S) -> Option<R> {
    match store.read(R::SLOT) {
        Ok(Some(text)) => {
            let record = R::parse(&text);
            if record.is_none() {
                tracing::warn!(slot = R::SLOT, "ignoring malformed saved configuration");
            }
            record
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(slot = R::SLOT, error = %e, "failed to read saved configuration");
            None
        }
    }
}

/// Persist a record into its slot.
pub fn save<R: Record, S: SlotStore + ?Sized>(store: &S, record: &R) -> Result<(), S::Error> {
    store.write(R::SLOT, &record.to_json_pretty())
}

// ── Untyped field helpers ───────────────────────────────────────────

pub(crate) fn object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()
}

pub(crate) fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)?.as_str().map(str::to_owned)
}

pub(crate) fn bool_field(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key)?.as_bool()
}

pub(crate) fn number_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Number> {
    match obj.get(key)? {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

/// Integral value of a JSON number. Floats with a zero fractional part count
/// as integers; anything else does not.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub(crate) fn integral(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        // Above i64::MAX; out of range for every record field.
        return None;
    }
    let f = n.as_f64()?;
    // 2^53: beyond this an f64 no longer represents every integer exactly.
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MemorySlots(RefCell<HashMap<String, String>>);

    impl SlotStore for MemorySlots {
        type Error = std::io::Error;

        fn read(&self, slot: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.0.borrow().get(slot).cloned())
        }

        fn write(&self, slot: &str, text: &str) -> Result<(), Self::Error> {
            self.0.borrow_mut().insert(slot.into(), text.into());
            Ok(())
        }

        fn remove(&self, slot: &str) -> Result<(), Self::Error> {
            self.0.borrow_mut().remove(slot);
            Ok(())
        }
    }

    #[test]
    fn integral_accepts_whole_floats_only() {
        let n = |v: Value| match v {
            Value::Number(n) => n,
            _ => unreachable!(),
        };
        assert_eq!(integral(&n(json!(1500))), Some(1500));
        assert_eq!(integral(&n(json!(1500.0))), Some(1500));
        assert_eq!(integral(&n(json!(-3))), Some(-3));
        assert_eq!(integral(&n(json!(900.5))), None);
        assert_eq!(integral(&n(json!(u64::MAX))), None);
    }

    #[test]
    fn save_then_load_uses_record_slot() {
        let store = MemorySlots::default();
        let inter = Interface::new("eth0", 1400);
        save(&store, &inter).unwrap();

        assert!(store.0.borrow().contains_key("interface"));
        assert_eq!(load::<Interface, _>(&store), Some(inter));
        assert_eq!(load::<Device, _>(&store), None);
    }

    #[test]
    fn malformed_slot_loads_as_absent() {
        let store = MemorySlots::default();
        store.write("proxy", "{ definitely not json").unwrap();
        assert_eq!(load::<Proxy, _>(&store), None);

        store.write("proxy", r#"{"destination": ""}"#).unwrap();
        assert_eq!(load::<Proxy, _>(&store), None);
    }
}
