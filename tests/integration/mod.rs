//! Library-level integration tests.

pub mod panel_test;
