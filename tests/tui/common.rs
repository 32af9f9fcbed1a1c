//! Common test utilities for headless binary tests.

use std::path::Path;
use std::process::Command;

/// Output of one headless invocation.
pub struct HeadlessRun {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the qpanel binary in headless mode with the mock backend.
///
/// The config file points into `workdir` (and does not exist), exports go to
/// `workdir/downloads`, and the qpanel environment variables are cleared so
/// the host configuration never leaks in.
pub fn run_headless(workdir: &Path, args: &[&str]) -> HeadlessRun {
    let output = Command::new(env!("CARGO_BIN_EXE_qpanel"))
        .arg("--headless")
        .arg("--mock-backend")
        .arg("--config")
        .arg(workdir.join("missing.toml"))
        .arg("--download-dir")
        .arg(workdir.join("downloads"))
        .args(args)
        .env_remove("QPANEL_ENDPOINT")
        .env_remove("QPANEL_DATABASE")
        .env_remove("QPANEL_LOG")
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute qpanel");

    HeadlessRun {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}
