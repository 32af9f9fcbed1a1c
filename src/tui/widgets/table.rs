//! Result table widget for the TUI.
//!
//! Renders a result set as a bordered table. Columns come from the first
//! row's keys, in order; NULL cells are styled distinctly.

use crate::executor::{ResultSet, Row};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use serde_json::Value;

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Rendered text of a NULL cell.
const NULL_TEXT: &str = "NULL";

/// Widget for rendering a result set as a table.
pub struct ResultTable<'a> {
    rows: &'a ResultSet,
    scroll: usize,
}

impl<'a> ResultTable<'a> {
    pub fn new(rows: &'a ResultSet) -> Self {
        Self { rows, scroll: 0 }
    }

    /// Skips the first `scroll` data rows.
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    fn columns(&self) -> Vec<&'a str> {
        self.rows
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Text shown for a cell.
    pub fn display_value(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => NULL_TEXT.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    fn calculate_column_widths(&self, columns: &[&str]) -> Vec<usize> {
        let mut widths: Vec<usize> = columns
            .iter()
            .map(|name| name.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        for row in self.rows {
            for (i, name) in columns.iter().enumerate() {
                let len = Self::display_value(row.get(*name)).chars().count();
                widths[i] = widths[i].max(len);
            }
        }

        widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Truncates to `max_width` characters, adding an ellipsis when cut.
    fn truncate(s: &str, max_width: usize) -> String {
        if s.chars().count() <= max_width {
            s.to_string()
        } else if max_width <= 3 {
            s.chars().take(max_width).collect()
        } else {
            let kept: String = s.chars().take(max_width - 3).collect();
            format!("{kept}...")
        }
    }

    /// Renders the table to lines; `max_rows` caps the number of data rows.
    pub fn render_to_lines(&self, available_width: usize, max_rows: usize) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        let columns = self.columns();

        if columns.is_empty() {
            lines.push(Line::from(Span::styled(
                "(no rows returned)",
                Style::default().fg(Color::DarkGray),
            )));
            return lines;
        }

        let widths = self.calculate_column_widths(&columns);

        // Borders plus one space of padding on each side
        let total_width: usize = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
        let scale_factor = if total_width > available_width && available_width > 0 {
            available_width as f64 / total_width as f64
        } else {
            1.0
        };

        let adjusted_widths: Vec<usize> = widths
            .iter()
            .map(|&w| ((w as f64 * scale_factor) as usize).max(MIN_COLUMN_WIDTH))
            .collect();

        lines.push(Self::render_border(&adjusted_widths, '┌', '┬', '┐'));
        lines.push(Self::render_header_row(&columns, &adjusted_widths));
        lines.push(Self::render_border(&adjusted_widths, '├', '┼', '┤'));

        for row in self.rows.iter().skip(self.scroll).take(max_rows) {
            lines.push(Self::render_data_row(row, &columns, &adjusted_widths));
        }

        lines.push(Self::render_border(&adjusted_widths, '└', '┴', '┘'));

        let count = self.rows.len();
        let footer = format!("{} row{}", count, if count == 1 { "" } else { "s" });
        lines.push(Line::from(Span::styled(
            footer,
            Style::default().fg(Color::DarkGray),
        )));

        lines
    }

    fn render_border(widths: &[usize], left: char, mid: char, right: char) -> Line<'a> {
        let mut border = String::new();
        border.push(left);

        for (i, &width) in widths.iter().enumerate() {
            border.push_str(&"─".repeat(width + 2));
            if i < widths.len() - 1 {
                border.push(mid);
            }
        }

        border.push(right);

        Line::from(Span::styled(border, Style::default().fg(Color::DarkGray)))
    }

    fn render_header_row(columns: &[&str], widths: &[usize]) -> Line<'a> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (name, &width) in columns.iter().zip(widths) {
            let padded = format!(" {:width$} ", Self::truncate(name, width), width = width);
            spans.push(Span::styled(
                padded,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }

    fn render_data_row(row: &Row, columns: &[&str], widths: &[usize]) -> Line<'a> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (name, &width) in columns.iter().zip(widths) {
            let value = row.get(*name);
            let display = Self::display_value(value);
            let padded = format!(" {:width$} ", Self::truncate(&display, width), width = width);

            let style = if matches!(value, None | Some(Value::Null)) {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };

            spans.push(Span::styled(padded, style));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }
}

impl Widget for ResultTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Top border, header, separator, bottom border and footer
        let max_rows = (area.height as usize).saturating_sub(5);
        let lines = self.render_to_lines(area.width as usize, max_rows);

        for (i, line) in lines.iter().enumerate() {
            if i >= area.height as usize {
                break;
            }
            let y = area.y + i as u16;
            buf.set_line(area.x, y, line, area.width);
        }
    }
}
