//! qpanel - a terminal SQL query panel backed by a remote export endpoint.
//!
//! The library exposes the core modules for the binary and integration tests.

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod executor;
pub mod export;
pub mod highlight;
pub mod logging;
pub mod notify;
pub mod panel;
pub mod tui;
