//! Running stage: the redirected device's network settings and live traffic.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use pcap2socks_api::RunResponse;
use pcap2socks_core::convert::{self, Scaled};
use pcap2socks_core::Telemetry;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use super::screen_block;
use crate::action::Action;
use crate::component::Component;
use crate::theme;

/// What the traffic tiles show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Bytes,
    Packets,
}

impl DisplayMode {
    pub const COUNT: usize = 2;

    /// Mode for a selector index.
    ///
    /// # Panics
    ///
    /// On an index outside `0..COUNT`; the selector only ever cycles
    /// within range.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Bytes,
            1 => Self::Packets,
            _ => panic!("display mode index {index} out of range"),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::Packets => "packets",
        }
    }
}

pub struct RunningScreen {
    run: Option<RunResponse>,
    telemetry: Telemetry,
    mode: usize,
}

impl RunningScreen {
    pub fn new() -> Self {
        Self {
            run: None,
            telemetry: Telemetry::default(),
            mode: 0,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        DisplayMode::from_index(self.mode)
    }

    /// Traffic tiles for the current mode: `(label, value)`.
    fn traffic(&self) -> [(&'static str, Scaled); 4] {
        let t = &self.telemetry;
        match self.mode() {
            DisplayMode::Bytes => [
                ("Download", convert::byte_rate(t.download)),
                ("Upload", convert::byte_rate(t.upload)),
                ("Downloaded", convert::byte_total(t.download_total)),
                ("Uploaded", convert::byte_total(t.upload_total)),
            ],
            DisplayMode::Packets => [
                ("Download", convert::packet_rate(t.download_count)),
                ("Upload", convert::packet_rate(t.upload_count)),
                ("Downloaded", convert::packet_total(t.download_total_count)),
                ("Uploaded", convert::packet_total(t.upload_total_count)),
            ],
        }
    }

    fn render_network(&self, frame: &mut Frame, area: Rect) {
        let Some(run) = &self.run else {
            return;
        };
        let row = |label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {label:<12}"), theme::muted()),
                Span::styled(value, theme::text()),
            ])
        };
        let mut lines = vec![
            row("Device IP", run.src_ip.clone()),
            row("Subnet mask", run.mask.clone()),
            row("Gateway", run.gateway.clone()),
            row("NAT type", run.nat.to_string()),
        ];
        if let Some(mtu) = run.mtu {
            lines.push(row("MTU", mtu.to_string()));
        }
        if let Some(remote) = &run.remote_ip {
            lines.push(row("Proxy IP", remote.clone()));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }
}

/// A bordered tile with a label and one big value.
fn tile(frame: &mut Frame, area: Rect, label: &str, value: &Scaled, style: Style) {
    let block = Block::default()
        .title(Span::styled(format!(" {label} "), theme::muted()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(Span::styled(value.to_string(), style)).alignment(Alignment::Center),
        inner,
    );
}

impl Component for RunningScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Char('m') {
            return Ok(Some(Action::CycleDisplayMode));
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RunStarted(run) => {
                self.run = Some(run.clone());
                self.telemetry = Telemetry::default();
            }
            Action::TelemetryUpdated(telemetry) => self.telemetry = *telemetry,
            Action::CycleDisplayMode => self.mode = (self.mode + 1) % DisplayMode::COUNT,
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = screen_block("Running");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(7),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "  Configure the device with these network settings",
                theme::text(),
            )),
            layout[0],
        );
        self.render_network(frame, layout[1]);

        let halves = |area: Rect| {
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area)
        };

        let top = halves(layout[2]);
        frame.render_widget(
            Paragraph::new(Span::styled(
                convert::format_duration(self.telemetry.elapsed),
                theme::metric_value(),
            ))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(Span::styled(" Elapsed ", theme::muted()))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_default()),
            ),
            top[0],
        );
        let latency = convert::latency(self.telemetry.latency);
        tile(frame, top[1], "Latency", &latency, theme::latency(&latency));

        let traffic = self.traffic();
        for (row, pair) in [layout[3], layout[4]].into_iter().zip(traffic.chunks(2)) {
            let cells = halves(row);
            for (cell, (label, value)) in cells.iter().zip(pair) {
                tile(frame, *cell, label, value, theme::metric_value());
            }
        }

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("  showing {}", self.mode().label()),
                theme::muted(),
            )),
            layout[5],
        );
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("m", "bytes/packets")]
    }

    fn id(&self) -> &str {
        "running"
    }
}
