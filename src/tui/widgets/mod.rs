//! TUI widgets for the query panel.

pub mod controls;
pub mod editor;
pub mod empty_state;
pub mod spinner;
pub mod table;
pub mod toast;
