//! Subprocess harness: runs a command template (by default `cargo bench`)
//! with the config passed through `LANES` and `ITERATIONS`.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

use shlex::Shlex;
use tracing::debug;

use crate::core::schema::BenchConfig;
use crate::{BenchError, BenchResult};

use super::traits::{Harness, Invocation};

/// Default harness command. `{bench}` is replaced by the bench target name.
pub const DEFAULT_HARNESS_COMMAND: &str =
    "cargo bench -p binius-examples --bench {bench} -- --noplot";

/// Default bench target, also the prefix of its Criterion groups.
pub const DEFAULT_BENCH: &str = "iterated_f";

const NATIVE_FLAG: &str = "-C target-cpu=native";

/// Configuration for the command harness.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Shell-style command template (placeholders: {lanes},{iterations},{bench})
    pub template: String,
    /// Bench target name substituted for {bench}
    pub bench: String,
    /// Working directory for the command
    pub workdir: PathBuf,
    /// Append `-C target-cpu=native` to the inherited RUSTFLAGS
    pub target_cpu_native: bool,
}

impl Default for CommandConfig {
    fn default() -> Self {
        CommandConfig {
            template: DEFAULT_HARNESS_COMMAND.to_string(),
            bench: DEFAULT_BENCH.to_string(),
            workdir: PathBuf::from("."),
            target_cpu_native: false,
        }
    }
}

impl CommandConfig {
    /// Create a config running the default command in `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        CommandConfig {
            workdir: workdir.into(),
            ..Default::default()
        }
    }

    /// Replace the command template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Set the bench target name.
    pub fn with_bench(mut self, bench: impl Into<String>) -> Self {
        self.bench = bench.into();
        self
    }

    /// Ask the compiler to target the host CPU.
    pub fn with_target_cpu_native(mut self, enabled: bool) -> Self {
        self.target_cpu_native = enabled;
        self
    }
}

/// RUSTFLAGS with the native-CPU flag appended to whatever was inherited.
pub fn rustflags_with_native(existing: Option<&str>) -> String {
    match existing.map(str::trim).filter(|s| !s.is_empty()) {
        Some(flags) if flags.contains(NATIVE_FLAG) => flags.to_string(),
        Some(flags) => format!("{flags} {NATIVE_FLAG}"),
        None => NATIVE_FLAG.to_string(),
    }
}

fn split_template(template: &str) -> BenchResult<Vec<String>> {
    let mut lexer = Shlex::new(template);
    let parts: Vec<String> = lexer.by_ref().collect();
    if lexer.had_error {
        return Err(BenchError::Usage(format!(
            "harness command template has unbalanced quoting: {template}"
        )));
    }
    if parts.is_empty() {
        return Err(BenchError::Usage("empty harness command template".into()));
    }
    Ok(parts)
}

/// Harness backed by an external command.
pub struct CommandHarness {
    config: CommandConfig,
}

impl CommandHarness {
    pub fn new(config: CommandConfig) -> Self {
        CommandHarness { config }
    }

    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Reject a template that cannot be split into a command line.
    pub fn check_template(&self) -> BenchResult<()> {
        split_template(&self.config.template).map(|_| ())
    }

    /// Build the command for one config without running it.
    pub fn build_command(&self, config: &BenchConfig) -> BenchResult<Command> {
        let mut parts = split_template(&self.config.template)?;
        let lanes_s = config.lanes.to_string();
        let iterations_s = config.iterations.to_string();
        for p in &mut parts {
            *p = p
                .replace("{lanes}", &lanes_s)
                .replace("{iterations}", &iterations_s)
                .replace("{bench}", &self.config.bench);
        }

        let mut cmd = Command::new(&parts[0]);
        cmd.args(&parts[1..])
            .current_dir(&self.config.workdir)
            .env("LANES", &lanes_s)
            .env("ITERATIONS", &iterations_s);
        if self.config.target_cpu_native {
            let inherited = std::env::var("RUSTFLAGS").ok();
            cmd.env("RUSTFLAGS", rustflags_with_native(inherited.as_deref()));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(cmd)
    }
}

impl Harness for CommandHarness {
    fn name(&self) -> &str {
        "command"
    }

    fn invoke(&self, config: &BenchConfig) -> BenchResult<Invocation> {
        let mut cmd = self.build_command(config)?;
        debug!(command = ?cmd, "spawning harness");

        let start = Instant::now();
        let output = cmd.output().map_err(|e| {
            BenchError::Message(format!(
                "failed to run harness `{}`: {e}",
                cmd.get_program().to_string_lossy()
            ))
        })?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let stdout_s = String::from_utf8_lossy(&output.stdout);
        debug!(bytes = stdout_s.len(), "harness stdout captured");

        Ok(Invocation {
            success: output.status.success(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed_ms,
        })
    }
}
