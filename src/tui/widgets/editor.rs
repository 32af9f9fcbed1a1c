//! SQL editor widget.
//!
//! Draws the active tab's buffer with line numbers and syntax colours. While
//! the highlighter is still loading, a spinner is shown instead.

use super::spinner::Spinner;
use crate::editor::QueryBuffer;
use crate::highlight::{SqlHighlighter, TokenClass};
use crate::panel::{LoadState, EDITOR_PLACEHOLDER};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Width of the line-number gutter, including the trailing space.
pub const GUTTER_WIDTH: u16 = 4;

/// First buffer row to draw so the cursor row stays inside `height` rows.
pub fn first_visible_row(cursor_row: usize, height: usize) -> usize {
    if height == 0 {
        0
    } else {
        cursor_row.saturating_sub(height - 1)
    }
}

/// First char column to draw so the cursor column stays inside `width` columns.
///
/// All visible lines scroll together, the same way rows do.
pub fn first_visible_col(cursor_col: usize, width: usize) -> usize {
    first_visible_row(cursor_col, width)
}

/// Drops the first `skip` chars from a run of fragments.
fn skip_chars(fragments: Vec<(TokenClass, String)>, mut skip: usize) -> Vec<(TokenClass, String)> {
    let mut kept = Vec::with_capacity(fragments.len());
    for (class, text) in fragments {
        let len = text.chars().count();
        if skip >= len {
            skip -= len;
            continue;
        }
        kept.push((class, text.chars().skip(skip).collect()));
        skip = 0;
    }
    kept
}

/// Screen position of the cursor for an editor drawn in `area`.
///
/// Returns `None` when the area is too small to hold any text.
pub fn cursor_screen_position(buffer: &QueryBuffer, area: Rect) -> Option<Position> {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    if inner.width <= GUTTER_WIDTH || inner.height == 0 {
        return None;
    }

    let (row, col) = buffer.cursor_position();
    let top = first_visible_row(row, inner.height as usize);
    let left = first_visible_col(col, (inner.width - GUTTER_WIDTH) as usize);

    let x = inner.x + GUTTER_WIDTH + (col - left) as u16;
    let y = inner.y + (row - top) as u16;
    Some(Position::new(x, y))
}

fn token_style(class: TokenClass) -> Style {
    match class {
        TokenClass::Keyword => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        TokenClass::String => Style::default().fg(Color::Green),
        TokenClass::Number => Style::default().fg(Color::Yellow),
        TokenClass::Comment => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        TokenClass::Plain => Style::default(),
    }
}

/// Editor widget.
pub struct EditorView<'a> {
    buffer: &'a QueryBuffer,
    state: &'a LoadState<SqlHighlighter>,
    spinner: Option<&'a Spinner>,
    focused: bool,
}

impl<'a> EditorView<'a> {
    pub fn new(
        buffer: &'a QueryBuffer,
        state: &'a LoadState<SqlHighlighter>,
        spinner: Option<&'a Spinner>,
        focused: bool,
    ) -> Self {
        Self {
            buffer,
            state,
            spinner,
            focused,
        }
    }

    fn block(&self) -> Block<'static> {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Query ")
    }

    fn text_lines(&self, highlighter: &SqlHighlighter, inner: Rect) -> Vec<Line<'static>> {
        let gutter_style = Style::default().fg(Color::DarkGray);

        if self.buffer.is_empty() {
            return vec![Line::from(vec![
                Span::styled(format!("{:>3} ", 1), gutter_style),
                Span::styled(
                    EDITOR_PLACEHOLDER,
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ])];
        }

        let height = inner.height as usize;
        let (cursor_row, cursor_col) = self.buffer.cursor_position();
        let top = first_visible_row(cursor_row, height);
        let left = first_visible_col(
            cursor_col,
            inner.width.saturating_sub(GUTTER_WIDTH) as usize,
        );

        self.buffer
            .text()
            .split('\n')
            .enumerate()
            .skip(top)
            .take(height)
            .map(|(i, line)| {
                let mut spans = vec![Span::styled(format!("{:>3} ", i + 1), gutter_style)];
                spans.extend(
                    skip_chars(highlighter.highlight_line(line), left)
                        .into_iter()
                        .map(|(class, text)| Span::styled(text, token_style(class))),
                );
                Line::from(spans)
            })
            .collect()
    }
}

impl Widget for EditorView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        let inner = block.inner(area);

        let lines = match self.state {
            LoadState::Ready(highlighter) => self.text_lines(highlighter, inner),
            LoadState::Loading => {
                let label = self
                    .spinner
                    .map(Spinner::display)
                    .unwrap_or_else(|| Spinner::loading_editor().label().to_string());
                vec![Line::from(Span::styled(
                    label,
                    Style::default().fg(Color::Yellow),
                ))]
            }
            LoadState::Failed(reason) => vec![Line::from(Span::styled(
                format!("Editor unavailable: {reason}"),
                Style::default().fg(Color::Red),
            ))],
        };

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
