//! Host environment captured alongside stored results.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Machine and toolchain details that make a timing comparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ram_bytes: Option<u64>,

    pub os: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_dirty: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rustc_version: Option<String>,

    /// RUSTFLAGS as seen by this process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rustflags: Option<String>,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        EnvironmentInfo {
            cpu_model: None,
            cpu_cores: None,
            total_ram_bytes: None,
            os: std::env::consts::OS.to_string(),
            hostname: None,
            git_sha: None,
            git_dirty: None,
            rustc_version: None,
            rustflags: None,
        }
    }
}

impl EnvironmentInfo {
    /// Detect environment information for the workspace the harness runs in.
    pub fn detect(workspace: &Path) -> Self {
        use sysinfo::System;

        let mut sys = System::new_all();
        sys.refresh_all();

        let cpu_model = sys.cpus().first().map(|c| c.brand().to_string());
        let cpu_cores = sys.physical_core_count().map(|c| c as u32);
        let total_ram_bytes = Some(sys.total_memory());
        let os = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
        let hostname = System::host_name();

        EnvironmentInfo {
            cpu_model,
            cpu_cores,
            total_ram_bytes,
            os,
            hostname,
            git_sha: detect_git_sha(workspace),
            git_dirty: detect_git_dirty(workspace),
            rustc_version: detect_rustc_version(),
            rustflags: std::env::var("RUSTFLAGS").ok().filter(|s| !s.trim().is_empty()),
        }
    }
}

fn trimmed_stdout(cmd: &mut Command) -> Option<String> {
    cmd.output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Detect git SHA from `git rev-parse HEAD`
fn detect_git_sha(workspace: &Path) -> Option<String> {
    trimmed_stdout(
        Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(workspace),
    )
}

/// Detect if git working directory is dirty
fn detect_git_dirty(workspace: &Path) -> Option<bool> {
    Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(workspace)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| !o.stdout.is_empty())
}

fn detect_rustc_version() -> Option<String> {
    trimmed_stdout(Command::new("rustc").arg("--version"))
}
