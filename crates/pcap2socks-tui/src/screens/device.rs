//! Device stage: address preset, plus source and gateway for custom setups.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use pcap2socks_core::{Form, Preset};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Span;
use ratatui::widgets::Paragraph;

use super::screen_block;
use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::choice::choice_lines;
use crate::widgets::field::{FIELD_HEIGHT, TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Preset,
    Source,
    Publish,
}

pub struct DeviceScreen {
    preset: usize,
    source: TextField,
    publish: TextField,
    focus: Focus,
}

impl DeviceScreen {
    pub fn new() -> Self {
        let defaults = Form::default();
        let mut screen = Self {
            preset: 0,
            source: TextField::new("Source IP or CIDR", &defaults.source),
            publish: TextField::new("Virtual gateway (empty for none)", &defaults.publish),
            focus: Focus::Preset,
        };
        screen.set_preset(defaults.preset);
        screen
    }

    fn set_preset(&mut self, value: u8) {
        let preset = Preset::from_value(value).unwrap_or_default();
        self.preset = Preset::ALL.iter().position(|p| *p == preset).unwrap_or(0);
    }

    fn custom(&self) -> bool {
        Preset::ALL[self.preset] == Preset::Custom
    }

    /// Source and gateway inputs only exist for the custom preset.
    fn cycle_focus(&mut self, forward: bool) {
        self.focus = match (self.focus, forward, self.custom()) {
            (_, _, false) => Focus::Preset,
            (Focus::Preset, true, true) | (Focus::Publish, false, true) => Focus::Source,
            (Focus::Source, true, true) | (Focus::Preset, false, true) => Focus::Publish,
            (Focus::Publish, true, true) | (Focus::Source, false, true) => Focus::Preset,
        };
    }
}

impl Component for DeviceScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (self.focus, key.code) {
            (_, KeyCode::Tab) => self.cycle_focus(true),
            (_, KeyCode::BackTab) => self.cycle_focus(false),
            (Focus::Preset, KeyCode::Up) => self.preset = self.preset.saturating_sub(1),
            (Focus::Preset, KeyCode::Down) => {
                self.preset = (self.preset + 1).min(Preset::ALL.len() - 1);
            }
            (Focus::Source, _) => {
                self.source.handle_key(key);
            }
            (Focus::Publish, _) => {
                self.publish.handle_key(key);
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::LoadForm(form) = action {
            self.set_preset(form.preset);
            self.source.set_value(&form.source);
            self.publish.set_value(&form.publish);
            self.focus = Focus::Preset;
        }
        Ok(None)
    }

    fn write_form(&self, form: &mut Form) {
        form.preset = Preset::ALL[self.preset].value();
        self.source.value().clone_into(&mut form.source);
        self.publish.value().clone_into(&mut form.publish);
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = screen_block("Device");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(7),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Min(0),
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "  The device whose traffic is redirected",
                theme::text(),
            )),
            layout[0],
        );

        let presets = Preset::ALL
            .iter()
            .map(|p| (p.to_string(), Some(p.description())));
        frame.render_widget(
            Paragraph::new(choice_lines(
                presets,
                self.preset,
                self.focus == Focus::Preset,
            )),
            layout[1],
        );

        if self.custom() {
            self.source
                .render(frame, layout[2], self.focus == Focus::Source);
            self.publish
                .render(frame, layout[3], self.focus == Focus::Publish);
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("\u{2191}/\u{2193}", "preset"), ("Tab", "field")]
    }

    fn id(&self) -> &str {
        "device"
    }
}
