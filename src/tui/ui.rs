//! UI rendering for the TUI.
//!
//! Layout, top to bottom: controls bar, editor, results area. The toast is
//! drawn last, over everything else.

use super::app::{App, Focus};
use super::widgets::{controls, editor, empty_state, table, toast};
use crate::panel::ResultsView;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};

/// Editor height: six text rows plus borders.
const EDITOR_HEIGHT: u16 = 8;

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Controls
            Constraint::Length(EDITOR_HEIGHT), // Editor
            Constraint::Min(3),                // Results
        ])
        .split(area);

    render_controls(frame, main_layout[0], app);
    render_editor(frame, main_layout[1], app);
    render_results(frame, main_layout[2], app);
    render_toast(frame, area, app);
}

fn render_controls(frame: &mut Frame, area: Rect, app: &App) {
    let editor = app.panel.editor();
    let widget = controls::ControlsBar::new(
        editor.editor_tabs(),
        editor.active_index(),
        app.panel.database(),
        app.run_spinner.as_ref(),
    );
    frame.render_widget(widget, area);
}

fn render_editor(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Editor;
    let buffer = app.panel.editor().buffer();
    let widget = editor::EditorView::new(
        buffer,
        app.panel.editor_state(),
        Some(&app.editor_spinner),
        focused,
    );
    frame.render_widget(widget, area);

    if focused && app.panel.is_editor_ready() {
        if let Some(position) = editor::cursor_screen_position(buffer, area) {
            frame.set_cursor_position(position);
        }
    }
}

fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    match app.panel.view() {
        ResultsView::Empty => frame.render_widget(empty_state::EmptyState, area),
        ResultsView::Results(rows) => {
            let border_style = if app.focus == Focus::Results {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(" Results ");
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                table::ResultTable::new(rows).scroll(app.results_scroll),
                inner,
            );
        }
    }
}

fn render_toast(frame: &mut Frame, screen: Rect, app: &App) {
    let toasts = app.panel.notifier();
    if toasts.is_visible() {
        frame.render_widget(
            toast::Toast::new(toasts.kind(), toasts.message()),
            toast::Toast::area(screen),
        );
    }
}
