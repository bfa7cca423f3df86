//! Vertical single-choice list with a `▸` marker on the selected entry.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::theme;

/// One line per option, plus an optional dimmed description under each.
pub fn choice_lines<'a>(
    options: impl IntoIterator<Item = (String, Option<&'a str>)>,
    selected: usize,
    focused: bool,
) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for (i, (label, description)) in options.into_iter().enumerate() {
        let is_selected = i == selected;
        let marker = if is_selected { "\u{25B8} " } else { "  " };
        let label_style = match (is_selected, focused) {
            (true, true) => theme::selected(),
            (true, false) => Style::default().fg(theme::NEON_CYAN),
            _ => theme::text(),
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(theme::ELECTRIC_PURPLE)),
            Span::styled(label, label_style),
        ]));
        if let Some(description) = description {
            lines.push(Line::from(Span::styled(
                format!("    {description}"),
                theme::muted(),
            )));
        }
    }
    lines
}

/// `[x] label` checkbox line.
pub fn toggle_line(label: &str, on: bool, focused: bool) -> Line<'static> {
    let mark = if on { "[x] " } else { "[ ] " };
    let style = if focused {
        Style::default()
            .fg(theme::NEON_CYAN)
            .add_modifier(Modifier::BOLD)
    } else {
        theme::text()
    };
    Line::from(vec![
        Span::styled(mark, Style::default().fg(theme::ELECTRIC_PURPLE)),
        Span::styled(label.to_owned(), style),
    ])
}
