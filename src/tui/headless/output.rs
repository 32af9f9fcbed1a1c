//! Output formatting for headless runs: text, JSON and frames.

use super::{HeadlessResult, HeadlessState};
use crate::error::PanelError;
use ratatui::buffer::Buffer;
use serde::Serialize;
use std::str::FromStr;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Final screen as plain text.
    #[default]
    Text,
    /// Screen, state and assertion summary as JSON.
    Json,
    /// Every captured frame, one after another.
    Frames,
}

impl FromStr for OutputFormat {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "frames" => Ok(Self::Frames),
            _ => Err(PanelError::config(format!(
                "Invalid output format '{s}'. Expected: text, json or frames"
            ))),
        }
    }
}

/// Turns a terminal buffer into text.
pub struct ScreenRenderer;

impl ScreenRenderer {
    /// Renders `buffer` with trailing spaces and trailing blank lines removed.
    pub fn render(buffer: &Buffer) -> String {
        let area = buffer.area;

        let mut lines: Vec<String> = (area.y..area.bottom())
            .map(|y| {
                let line: String = (area.x..area.right())
                    .map(|x| buffer.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
                    .collect();
                line.trim_end().to_string()
            })
            .collect();

        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        format!("{}\n", lines.join("\n"))
    }
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    screen: &'a str,
    screen_lines: &'a [String],
    events_executed: usize,
    duration_ms: u64,
    assertions: AssertionSummary,
    state: &'a HeadlessState,
}

#[derive(Debug, Serialize)]
struct AssertionSummary {
    passed: usize,
    failed: usize,
}

/// Formats a [`HeadlessResult`].
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, result: &HeadlessResult) -> String {
        match self.format {
            OutputFormat::Text => Self::format_text(result),
            OutputFormat::Json => Self::format_json(result),
            OutputFormat::Frames => Self::format_frames(result),
        }
    }

    fn assertion_summary(result: &HeadlessResult) -> Option<String> {
        (result.assertions_passed + result.assertions_failed > 0).then(|| {
            format!(
                "Assertions: {} passed, {} failed",
                result.assertions_passed, result.assertions_failed
            )
        })
    }

    fn format_text(result: &HeadlessResult) -> String {
        let assertions = Self::assertion_summary(result)
            .map(|s| format!(" | {s}"))
            .unwrap_or_default();

        format!(
            "{}\nEvents: {} executed in {}ms{}\n",
            result.screen,
            result.events_executed,
            result.duration.as_millis(),
            assertions
        )
    }

    fn format_json(result: &HeadlessResult) -> String {
        let output = JsonOutput {
            screen: &result.screen,
            screen_lines: &result.screen_lines,
            events_executed: result.events_executed,
            duration_ms: result.duration.as_millis() as u64,
            assertions: AssertionSummary {
                passed: result.assertions_passed,
                failed: result.assertions_failed,
            },
            state: &result.state,
        };

        serde_json::to_string_pretty(&output)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {e}\"}}"))
    }

    fn format_frames(result: &HeadlessResult) -> String {
        let mut out: String = result
            .frames
            .iter()
            .map(|frame| {
                format!(
                    "=== FRAME {} ({}) ===\n{}\n\n",
                    frame.number,
                    frame.event.as_deref().unwrap_or("initial"),
                    frame.screen
                )
            })
            .collect();

        out.push_str(&format!(
            "Total: {} frames, {} events executed in {}ms\n",
            result.frames.len(),
            result.events_executed,
            result.duration.as_millis()
        ));
        if let Some(summary) = Self::assertion_summary(result) {
            out.push_str(&summary);
            out.push('\n');
        }
        out
    }
}
