//! Toast notification widget for the TUI.

use crate::notify::ToastKind;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Toast notification widget.
pub struct Toast<'a> {
    kind: ToastKind,
    message: &'a str,
}

impl<'a> Toast<'a> {
    pub fn new(kind: ToastKind, message: &'a str) -> Self {
        Self { kind, message }
    }

    /// Calculates the area for the toast (bottom-right corner).
    pub fn area(screen: Rect) -> Rect {
        let width = 40.min(screen.width.saturating_sub(4));
        let height = 3.min(screen.height);
        let x = screen.x + screen.width.saturating_sub(width + 2);
        let y = screen.y + screen.height.saturating_sub(height + 1);
        Rect::new(x, y, width, height)
    }

    fn color(&self) -> Color {
        match self.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        }
    }
}

impl Widget for Toast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let title = match self.kind {
            ToastKind::Success => " Success ",
            ToastKind::Error => " Error ",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.color()))
            .title(title)
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(area);
        block.render(area, buf);

        let max_len = inner.width as usize;
        let display_msg = if self.message.chars().count() > max_len {
            let kept: String = self.message.chars().take(max_len.saturating_sub(1)).collect();
            format!("{kept}…")
        } else {
            self.message.to_string()
        };

        let line = Line::from(vec![Span::styled(
            display_msg,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )]);

        Paragraph::new(line).render(inner, buf);
    }
}
