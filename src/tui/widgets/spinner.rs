//! Spinner widget state for in-flight work.

use std::time::Instant;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Animation speed in milliseconds per frame.
const FRAME_DURATION_MS: u128 = 100;

/// Time-driven spinner with a label.
#[derive(Debug, Clone)]
pub struct Spinner {
    start_time: Instant,
    label: String,
}

impl Spinner {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            label: label.into(),
        }
    }

    /// Spinner shown while a query is in flight.
    pub fn executing() -> Self {
        Self::new("Executing")
    }

    /// Spinner shown in place of the editor while it loads.
    pub fn loading_editor() -> Self {
        Self::new("Loading editor…")
    }

    /// Returns the current frame of the animation.
    pub fn frame(&self) -> &'static str {
        let elapsed_ms = self.start_time.elapsed().as_millis();
        let frame_index = (elapsed_ms / FRAME_DURATION_MS) as usize;
        FRAMES[frame_index % FRAMES.len()]
    }

    pub fn display(&self) -> String {
        format!("{} {}", self.frame(), self.label)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_executing() {
        let spinner = Spinner::executing();
        assert_eq!(spinner.label(), "Executing");
        assert!(FRAMES.contains(&spinner.frame()));
    }

    #[test]
    fn test_spinner_display() {
        let spinner = Spinner::loading_editor();
        assert!(spinner.display().ends_with("Loading editor…"));
    }
}
