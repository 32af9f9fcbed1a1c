//! Controls bar: editor tabs, database, run status and key hints.

use super::spinner::Spinner;
use crate::editor::EditorTab;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Key hints shown on the right of the bar.
pub const KEY_HINTS: &str = "F5 Run · F2 SQL · F3 CSV · F4 JSON";

/// One-line bar above the editor.
pub struct ControlsBar<'a> {
    tabs: &'a [EditorTab],
    active: usize,
    database: &'a str,
    spinner: Option<&'a Spinner>,
}

impl<'a> ControlsBar<'a> {
    pub fn new(
        tabs: &'a [EditorTab],
        active: usize,
        database: &'a str,
        spinner: Option<&'a Spinner>,
    ) -> Self {
        Self {
            tabs,
            active,
            database,
            spinner,
        }
    }
}

impl Widget for ControlsBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let style = Style::default().bg(Color::Blue).fg(Color::White);
        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let active_style = Style::default()
            .bg(Color::White)
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD);

        // Tabs
        let mut x = area.x;
        for (i, tab) in self.tabs.iter().enumerate() {
            if x >= area.right() {
                break;
            }
            let label = format!(" {} ", tab.title);
            let tab_style = if i == self.active { active_style } else { style };
            let span = Span::styled(label, tab_style);
            let width = span.width() as u16;
            buf.set_span(x, area.y, &span, area.right() - x);
            x = x.saturating_add(width + 1);
        }

        // Database and run status
        if x < area.right() {
            let db = if self.database.is_empty() {
                "[db: -]".to_string()
            } else {
                format!("[db: {}]", self.database)
            };
            let status = match self.spinner {
                Some(spinner) => format!(" {db}  {}", spinner.display()),
                None => format!(" {db}"),
            };
            let status_style = if self.spinner.is_some() {
                style.fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                style
            };
            let span = Span::styled(status, status_style);
            buf.set_span(x, area.y, &span, area.right() - x);
            x = x.saturating_add(span.width() as u16);
        }

        // Key hints, only when they fit
        let hints_width = KEY_HINTS.chars().count() as u16 + 1;
        if x.saturating_add(hints_width) < area.right() {
            let hints_x = area.right() - hints_width;
            buf.set_string(hints_x, area.y, KEY_HINTS, style.add_modifier(Modifier::DIM));
        }
    }
}
