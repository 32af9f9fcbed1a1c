//! Toast notifications.
//!
//! The panel reports every outcome (validation failures, run results, exports)
//! through a [`NotificationSink`]. [`Toasts`] is the holder the TUI renders from.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Success,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Receives user-facing notifications.
pub trait NotificationSink {
    /// Shows a toast, replacing whatever was showing before.
    fn show_toast(&mut self, kind: ToastKind, message: &str);
}

/// Holds the state of the single on-screen toast.
#[derive(Debug, Clone)]
pub struct Toasts {
    visible: bool,
    kind: ToastKind,
    message: String,
    shown_at: Option<Instant>,
    duration: Duration,
}

impl Toasts {
    /// Creates a hidden toast holder whose toasts expire after `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            visible: false,
            kind: ToastKind::default(),
            message: String::new(),
            shown_at: None,
            duration,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn kind(&self) -> ToastKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Hides the toast immediately.
    pub fn dismiss(&mut self) {
        self.visible = false;
        self.shown_at = None;
    }

    /// Hides the toast if it has been visible for longer than its duration.
    ///
    /// Returns true when a toast was cleared.
    pub fn clear_expired(&mut self, now: Instant) -> bool {
        match self.shown_at {
            Some(shown_at) if self.visible && now.duration_since(shown_at) >= self.duration => {
                self.dismiss();
                true
            }
            _ => false,
        }
    }
}

impl NotificationSink for Toasts {
    fn show_toast(&mut self, kind: ToastKind, message: &str) {
        self.visible = true;
        self.kind = kind;
        self.message = message.to_string();
        self.shown_at = Some(Instant::now());
    }
}
