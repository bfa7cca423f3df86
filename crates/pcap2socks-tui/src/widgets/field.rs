//! Single-line text input with a label, backed by `tui-input`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tui_input::{Input, InputRequest};

use crate::theme;

/// Rows a field occupies: label plus a bordered box.
pub const FIELD_HEIGHT: u16 = 4;

pub struct TextField {
    label: &'static str,
    input: Input,
    masked: bool,
    /// Digits only, at most this many.
    max_digits: Option<usize>,
}

impl TextField {
    pub fn new(label: &'static str, value: &str) -> Self {
        Self {
            label,
            input: Input::new(value.to_owned()),
            masked: false,
            max_digits: None,
        }
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn numeric(mut self, max_digits: usize) -> Self {
        self.max_digits = Some(max_digits);
        self
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_owned());
    }

    pub fn toggle_masked(&mut self) {
        self.masked = !self.masked;
    }

    /// Apply an editing key. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let request = match key.code {
            KeyCode::Char('w') if ctrl => InputRequest::DeletePrevWord,
            KeyCode::Char('k') if ctrl => InputRequest::DeleteTillEnd,
            KeyCode::Char(_) if ctrl => return false,
            KeyCode::Char(c) => {
                if let Some(max) = self.max_digits {
                    if !c.is_ascii_digit() || self.input.value().len() >= max {
                        return true;
                    }
                }
                InputRequest::InsertChar(c)
            }
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return false,
        };
        let _ = self.input.handle(request);
        true
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        if area.height < 3 {
            return;
        }
        let label_style = if focused {
            Style::default().fg(theme::NEON_CYAN)
        } else {
            theme::text()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(self.label, label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let box_area = Rect::new(area.x, area.y + 1, area.width, 3);
        let inner = block.inner(box_area);
        frame.render_widget(block, box_area);

        let width = usize::from(inner.width.max(1)).saturating_sub(1);
        let scroll = self.input.visual_scroll(width);
        let shown: String = if self.masked {
            "\u{25CF}".repeat(self.input.value().chars().count())
        } else {
            self.input.value().to_owned()
        };
        let visible: String = shown.chars().skip(scroll).collect();
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(visible, theme::metric_value()))),
            inner,
        );

        if focused {
            let offset = self.input.visual_cursor().saturating_sub(scroll);
            let x = inner
                .x
                .saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
                .min(inner.right().saturating_sub(1));
            frame.set_cursor_position(Position::new(x, inner.y));
        }
    }
}
