// ── Display unit conversion ──
//
// Pure formatting of raw measurements (seconds, milliseconds, bytes and
// packets, per second or cumulative) into a display magnitude and unit.
// Every function is total over `f64`, NaN and infinities included.

use std::fmt;

const KI: f64 = 1024.0;
const MI: f64 = 1024.0 * 1024.0;
const GI: f64 = 1024.0 * 1024.0 * 1024.0;

/// A unit ladder: thresholds from largest to smallest, and the unit used
/// below the smallest one.
#[derive(Debug, Clone, Copy)]
pub struct Scale {
    pub steps: &'static [(f64, &'static str)],
    pub base: &'static str,
}

pub const BYTE_RATE: Scale = Scale {
    steps: &[(GI, "GB/s"), (MI, "MB/s"), (KI, "kB/s")],
    base: "B/s",
};

pub const PACKET_RATE: Scale = Scale {
    steps: &[(GI, "Gp/s"), (MI, "Mp/s"), (KI, "kp/s")],
    base: "p/s",
};

pub const BYTE_TOTAL: Scale = Scale {
    steps: &[(GI, "GB"), (MI, "MB"), (KI, "kB")],
    base: "B",
};

pub const PACKET_TOTAL: Scale = Scale {
    steps: &[(GI, "Gp"), (MI, "Mp"), (KI, "kp")],
    base: "p",
};

/// Milliseconds become seconds strictly above one second.
pub const LATENCY: Scale = Scale {
    steps: &[(1000.0, "s")],
    base: "ms",
};

/// Scale `value` by the first threshold it strictly exceeds.
///
/// Below the smallest threshold the value and base unit come back unchanged.
pub fn scale_magnitude(value: f64, scale: &Scale) -> (f64, &'static str) {
    scale
        .steps
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map_or((value, scale.base), |(divisor, unit)| (value / divisor, *unit))
}

// ── Scaled value ────────────────────────────────────────────────────

/// A display magnitude with its unit.
///
/// Non-finite values render as `-` (NaN), `∞` or `-∞` and carry no unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaled {
    pub value: f64,
    pub unit: &'static str,
    pub precision: usize,
}

impl Scaled {
    const NOT_AVAILABLE: Self = Self {
        value: f64::NAN,
        unit: "",
        precision: 0,
    };

    /// The number alone, formatted at this value's precision.
    pub fn value_text(&self) -> String {
        if self.value.is_nan() {
            "-".into()
        } else if self.value == f64::INFINITY {
            "∞".into()
        } else if self.value == f64::NEG_INFINITY {
            "-∞".into()
        } else {
            format!("{:.*}", self.precision, self.value)
        }
    }
}

impl fmt::Display for Scaled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value_text();
        if self.unit.is_empty() {
            f.write_str(&value)
        } else {
            write!(f, "{value} {}", self.unit)
        }
    }
}

fn scaled(value: f64, scale: &Scale, precision: usize) -> Scaled {
    if !value.is_finite() {
        return Scaled::NOT_AVAILABLE;
    }
    let (value, unit) = scale_magnitude(value, scale);
    Scaled {
        value,
        unit,
        precision,
    }
}

// ── Conversions ─────────────────────────────────────────────────────

/// Format elapsed seconds as `H:MM:SS` from one hour up, `MM:SS` below.
///
/// NaN, infinite and negative inputs render as `-`; fractions are dropped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "-".into();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours == 0 {
        format!("{minutes:02}:{secs:02}")
    } else {
        format!("{hours}:{minutes:02}:{secs:02}")
    }
}

/// Latency in milliseconds. Unlike the traffic conversions, infinities are
/// kept and render as `∞`/`-∞`.
pub fn latency(ms: f64) -> Scaled {
    if !ms.is_finite() {
        return Scaled {
            value: ms,
            unit: "",
            precision: 0,
        };
    }
    let (value, unit) = scale_magnitude(ms, &LATENCY);
    let precision = if unit == LATENCY.base { 0 } else { 2 };
    Scaled {
        value,
        unit,
        precision,
    }
}

pub fn byte_rate(bytes_per_sec: f64) -> Scaled {
    scaled(bytes_per_sec, &BYTE_RATE, 2)
}

pub fn packet_rate(packets_per_sec: f64) -> Scaled {
    scaled(packets_per_sec, &PACKET_RATE, 2)
}

pub fn byte_total(bytes: f64) -> Scaled {
    scaled(bytes, &BYTE_TOTAL, 2)
}

pub fn packet_total(packets: f64) -> Scaled {
    scaled(packets, &PACKET_TOTAL, 2)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(f64::NAN), "-");
        assert_eq!(format_duration(f64::INFINITY), "-");
        assert_eq!(format_duration(-5.0), "-");
        assert_eq!(format_duration(0.0), "00:00");
        assert_eq!(format_duration(59.0), "00:59");
        assert_eq!(format_duration(59.9), "00:59");
        assert_eq!(format_duration(600.0), "10:00");
        assert_eq!(format_duration(3599.0), "59:59");
        assert_eq!(format_duration(3600.0), "1:00:00");
        assert_eq!(format_duration(3661.0), "1:01:01");
        assert_eq!(format_duration(360_000.0), "100:00:00");
    }

    #[test]
    fn rate_scaling() {
        let r = byte_rate(2_000_000.0);
        assert_eq!(r.unit, "MB/s");
        assert!((r.value - 1.907).abs() < 0.001, "got {}", r.value);
        assert_eq!(r.to_string(), "1.91 MB/s");

        let r = byte_rate(500.0);
        assert_eq!((r.value, r.unit), (500.0, "B/s"));
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(scale_magnitude(1024.0, &BYTE_RATE), (1024.0, "B/s"));
        assert_eq!(scale_magnitude(1025.0, &BYTE_RATE).1, "kB/s");
        assert_eq!(scale_magnitude(GI, &BYTE_TOTAL), (1024.0, "MB"));
        assert_eq!(scale_magnitude(3.0 * GI, &PACKET_TOTAL), (3.0, "Gp"));
        assert_eq!(scale_magnitude(1000.0, &LATENCY), (1000.0, "ms"));
    }

    #[test]
    fn traffic_non_finite_is_dash() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            for s in [byte_rate(v), packet_rate(v), byte_total(v), packet_total(v)] {
                assert_eq!(s.to_string(), "-");
                assert_eq!(s.unit, "");
            }
        }
    }

    #[test]
    fn latency_formats() {
        assert_eq!(latency(f64::NAN).to_string(), "-");
        assert_eq!(latency(f64::INFINITY).to_string(), "∞");
        assert_eq!(latency(f64::NEG_INFINITY).to_string(), "-∞");
        assert_eq!(latency(42.0).to_string(), "42 ms");
        assert_eq!(latency(1000.0).to_string(), "1000 ms");
        assert_eq!(latency(1500.0).to_string(), "1.50 s");
    }

    #[test]
    fn packet_units() {
        assert_eq!(packet_rate(2048.0).to_string(), "2.00 kp/s");
        assert_eq!(packet_total(12.0).to_string(), "12.00 p");
    }
}
