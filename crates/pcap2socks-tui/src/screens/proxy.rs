//! Proxy stage: upstream SOCKS proxy and its credentials.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pcap2socks_core::Form;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Span;
use ratatui::widgets::Paragraph;

use super::screen_block;
use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::choice::toggle_line;
use crate::widgets::field::{FIELD_HEIGHT, TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Destination,
    Authentication,
    Username,
    Password,
    Extra,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Self::Destination,
        Self::Authentication,
        Self::Username,
        Self::Password,
        Self::Extra,
    ];
}

pub struct ProxyScreen {
    destination: TextField,
    authentication: bool,
    username: TextField,
    password: TextField,
    extra: TextField,
    focus: Focus,
}

impl ProxyScreen {
    pub fn new() -> Self {
        let defaults = Form::default();
        Self {
            destination: TextField::new("Proxy address (host:port)", &defaults.destination),
            authentication: defaults.authentication,
            username: TextField::new("Username", &defaults.username),
            password: TextField::new("Password", &defaults.password).masked(),
            extra: TextField::new("Extra options", &defaults.extra),
            focus: Focus::Destination,
        }
    }

    fn visible(&self, focus: Focus) -> bool {
        self.authentication || !matches!(focus, Focus::Username | Focus::Password)
    }

    fn cycle_focus(&mut self, forward: bool) {
        let len = Focus::ORDER.len();
        let mut idx = Focus::ORDER
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0);
        loop {
            idx = if forward {
                (idx + 1) % len
            } else {
                (idx + len - 1) % len
            };
            if self.visible(Focus::ORDER[idx]) {
                break;
            }
        }
        self.focus = Focus::ORDER[idx];
    }

    fn field_mut(&mut self) -> Option<&mut TextField> {
        match self.focus {
            Focus::Destination => Some(&mut self.destination),
            Focus::Username => Some(&mut self.username),
            Focus::Password => Some(&mut self.password),
            Focus::Extra => Some(&mut self.extra),
            Focus::Authentication => None,
        }
    }
}

impl Component for ProxyScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.cycle_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.cycle_focus(false),
            KeyCode::Char(' ') if self.focus == Focus::Authentication => {
                self.authentication = !self.authentication;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.password.toggle_masked();
            }
            _ => {
                if let Some(field) = self.field_mut() {
                    field.handle_key(key);
                }
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::LoadForm(form) = action {
            self.destination.set_value(&form.destination);
            self.authentication = form.authentication;
            self.username.set_value(&form.username);
            self.password.set_value(&form.password);
            self.extra.set_value(&form.extra);
            self.focus = Focus::Destination;
        }
        Ok(None)
    }

    fn write_form(&self, form: &mut Form) {
        self.destination.value().clone_into(&mut form.destination);
        form.authentication = self.authentication;
        self.username.value().clone_into(&mut form.username);
        self.password.value().clone_into(&mut form.password);
        self.extra.value().clone_into(&mut form.extra);
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = screen_block("Proxy");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut constraints = vec![
            Constraint::Length(2),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(2),
        ];
        if self.authentication {
            constraints.push(Constraint::Length(FIELD_HEIGHT));
            constraints.push(Constraint::Length(FIELD_HEIGHT));
        }
        constraints.push(Constraint::Length(FIELD_HEIGHT));
        constraints.push(Constraint::Min(0));
        let layout = Layout::vertical(constraints).split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "  SOCKS5 proxy the device's traffic is sent through",
                theme::text(),
            )),
            layout[0],
        );
        self.destination
            .render(frame, layout[1], self.focus == Focus::Destination);
        frame.render_widget(
            Paragraph::new(toggle_line(
                "Authentication",
                self.authentication,
                self.focus == Focus::Authentication,
            )),
            layout[2],
        );

        let mut next = 3;
        if self.authentication {
            self.username
                .render(frame, layout[next], self.focus == Focus::Username);
            self.password
                .render(frame, layout[next + 1], self.focus == Focus::Password);
            next += 2;
        }
        self.extra
            .render(frame, layout[next], self.focus == Focus::Extra);
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("Tab", "field"), ("Space", "toggle"), ("^U", "reveal")]
    }

    fn id(&self) -> &str {
        "proxy"
    }
}
