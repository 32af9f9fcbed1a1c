//! Placeholder shown in the results area before the first successful run.

use crate::panel::{EMPTY_STATE_SUBTITLE, EMPTY_STATE_TITLE};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

const ICON: &str = "▤";

pub struct EmptyState;

impl Widget for EmptyState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Results ");
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = vec![
            Line::from(Span::styled(ICON, Style::default().fg(Color::Cyan))),
            Line::from(Span::styled(
                EMPTY_STATE_TITLE,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                EMPTY_STATE_SUBTITLE,
                Style::default().fg(Color::DarkGray),
            )),
        ];

        // Vertically centred
        let top = inner.height.saturating_sub(lines.len() as u16) / 2;
        let text_area = Rect::new(
            inner.x,
            inner.y + top,
            inner.width,
            inner.height.saturating_sub(top),
        );
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(text_area, buf);
    }
}
