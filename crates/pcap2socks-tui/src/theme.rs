//! SilkCircuit Neon palette and semantic styles.

use pcap2socks_core::convert::Scaled;
use ratatui::style::{Color, Modifier, Style};

// ── Palette ───────────────────────────────────────────────────────────

pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn text() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn muted() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn selected() -> Style {
    Style::default()
        .fg(ELECTRIC_PURPLE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Big numbers on the running dashboard.
pub fn metric_value() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Latency coloured by severity: unreachable red, 100 ms and up yellow.
pub fn latency(value: &Scaled) -> Style {
    if value.value == f64::INFINITY {
        Style::default().fg(ERROR_RED).add_modifier(Modifier::BOLD)
    } else if value.unit == "s" || (value.unit == "ms" && value.value >= 100.0) {
        Style::default().fg(ELECTRIC_YELLOW)
    } else if value.value.is_nan() {
        muted()
    } else {
        Style::default().fg(SUCCESS_GREEN)
    }
}
