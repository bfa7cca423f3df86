//! Interface stage: pick the capture interface and the MTU.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use pcap2socks_api::InterfaceInfo;
use pcap2socks_core::Form;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::screen_block;
use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::choice::choice_lines;
use crate::widgets::field::{FIELD_HEIGHT, TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Mtu,
}

pub struct InterfaceScreen {
    interfaces: Vec<InterfaceInfo>,
    selected: usize,
    /// Name to select once the list arrives.
    wanted: String,
    mtu: TextField,
    focus: Focus,
}

impl InterfaceScreen {
    pub fn new() -> Self {
        Self {
            interfaces: Vec::new(),
            selected: 0,
            wanted: String::new(),
            mtu: TextField::new("MTU (576-1500, 0 uses the interface MTU)", "0").numeric(4),
            focus: Focus::List,
        }
    }

    fn reselect(&mut self) {
        self.selected = self
            .interfaces
            .iter()
            .position(|i| i.name == self.wanted)
            .unwrap_or(0);
    }

    fn move_selection(&mut self, down: bool) {
        if self.interfaces.is_empty() {
            return;
        }
        let last = self.interfaces.len() - 1;
        self.selected = if down {
            (self.selected + 1).min(last)
        } else {
            self.selected.saturating_sub(1)
        };
        self.wanted.clone_from(&self.interfaces[self.selected].name);
    }
}

impl Component for InterfaceScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (self.focus, key.code) {
            (_, KeyCode::Tab | KeyCode::BackTab) => {
                self.focus = match self.focus {
                    Focus::List => Focus::Mtu,
                    Focus::Mtu => Focus::List,
                };
            }
            (Focus::List, KeyCode::Up) => self.move_selection(false),
            (Focus::List, KeyCode::Down) => self.move_selection(true),
            (Focus::Mtu, _) => {
                self.mtu.handle_key(key);
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::InterfacesLoaded(Ok(interfaces)) => {
                self.interfaces.clone_from(interfaces);
                self.reselect();
            }
            Action::LoadForm(form) => {
                self.wanted.clone_from(&form.interface);
                self.mtu.set_value(&form.mtu.to_string());
                self.reselect();
            }
            _ => {}
        }
        Ok(None)
    }

    fn write_form(&self, form: &mut Form) {
        form.interface = self
            .interfaces
            .get(self.selected)
            .map(|i| i.name.clone())
            .unwrap_or_default();
        form.mtu = self.mtu.value().parse().unwrap_or(0);
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = screen_block("Network interface");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(FIELD_HEIGHT),
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "  Interface the device is reachable on",
                theme::text(),
            )),
            layout[0],
        );

        let list_focused = self.focus == Focus::List;
        let lines = if self.interfaces.is_empty() {
            vec![Line::from(Span::styled(
                "  No interfaces found. Press ^R to ask the backend again.",
                theme::muted(),
            ))]
        } else {
            choice_lines(
                self.interfaces
                    .iter()
                    .map(|i| (format!("{}  (MTU {})", i.display_name(), i.mtu), None)),
                self.selected,
                list_focused,
            )
        };
        // Keep the selection visible in short terminals.
        let height = usize::from(layout[1].height.max(1));
        let scroll = self.selected.saturating_sub(height - 1);
        frame.render_widget(
            Paragraph::new(lines).scroll((u16::try_from(scroll).unwrap_or(0), 0)),
            layout[1],
        );

        self.mtu.render(frame, layout[2], self.focus == Focus::Mtu);
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("\u{2191}/\u{2193}", "select"), ("Tab", "field")]
    }

    fn id(&self) -> &str {
        "interface"
    }
}
