//! Welcome stage: what the tool does and where it keeps things.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use super::{StartupInfo, screen_block};
use crate::component::Component;
use crate::theme;

pub struct WelcomeScreen {
    info: StartupInfo,
}

impl WelcomeScreen {
    pub fn new(info: StartupInfo) -> Self {
        Self { info }
    }
}

impl Component for WelcomeScreen {
    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = screen_block("Welcome");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled("pcap2socks", theme::title_style()))
                .alignment(Alignment::Center),
            layout[0],
        );

        let intro = vec![
            Line::from(Span::styled(
                "Redirect the traffic of a device on your network, such as a game",
                theme::text(),
            )),
            Line::from(Span::styled(
                "console, through a SOCKS proxy. Pick the interface it is reachable",
                theme::text(),
            )),
            Line::from(Span::styled(
                "on, describe the device, point at the proxy, then run.",
                theme::text(),
            )),
        ];
        frame.render_widget(
            Paragraph::new(intro)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            layout[1],
        );

        let detail = |label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {label:<16}"), theme::muted()),
                Span::styled(value, theme::text()),
            ])
        };
        let details = vec![
            detail("Backend", self.info.endpoint.clone()),
            detail("Saved settings", self.info.data_dir.display().to_string()),
            detail("Proxy file", self.info.exchange_dir.display().to_string()),
        ];
        frame.render_widget(Paragraph::new(details), layout[2]);
    }

    fn id(&self) -> &str {
        "welcome"
    }
}
