//! Drives the harness across a configuration matrix.

use tracing::{info, info_span, warn};

use crate::backend::{Harness, Invocation};
use crate::core::schema::{BenchConfig, RunOutcome};

use super::config::ConfigurationMatrix;

/// Longest stderr tail kept in a failure cause.
const MAX_CAUSE_CHARS: usize = 400;

/// What happened to one config during the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRun {
    pub config: BenchConfig,
    pub outcome: RunOutcome,
}

fn failure_cause(inv: &Invocation) -> String {
    let trimmed = inv.stderr.trim();
    if trimmed.is_empty() {
        return match inv.exit_code {
            Some(code) => format!("harness exited with status {code}"),
            None => "harness terminated by signal".to_string(),
        };
    }
    let count = trimmed.chars().count();
    if count <= MAX_CAUSE_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().skip(count - MAX_CAUSE_CHARS).collect()
    }
}

/// Run one config. Harness errors become a failed outcome.
pub fn run_config<H: Harness + ?Sized>(harness: &H, config: &BenchConfig) -> RunOutcome {
    match harness.invoke(config) {
        Ok(inv) if inv.success => RunOutcome::Executed {
            elapsed_ms: inv.elapsed_ms,
        },
        Ok(inv) => RunOutcome::Failed {
            cause: failure_cause(&inv),
        },
        Err(e) => RunOutcome::Failed {
            cause: e.to_string(),
        },
    }
}

/// Run every config in matrix order, one at a time.
///
/// A failing config is logged and the sweep moves on. With `execute` unset
/// nothing is invoked and every config is reported as skipped.
pub fn run_configs<H: Harness + ?Sized>(
    harness: &H,
    matrix: &ConfigurationMatrix,
    execute: bool,
) -> Vec<ConfigRun> {
    let total = matrix.len();
    let mut runs = Vec::with_capacity(total);

    for (idx, config) in matrix.iter().enumerate() {
        let outcome = if execute {
            info!(
                harness = harness.name(),
                "[{}/{}] running {} (total ops {})",
                idx + 1,
                total,
                config,
                config.total_ops()
            );
            let span = info_span!("config", lanes = config.lanes, iterations = config.iterations);
            let _enter = span.enter();
            let outcome = run_config(harness, config);
            match &outcome {
                RunOutcome::Executed { elapsed_ms } => {
                    info!(%config, elapsed_ms, "config finished")
                }
                RunOutcome::Failed { cause } => warn!(%config, %cause, "config failed"),
                RunOutcome::Skipped => {}
            }
            outcome
        } else {
            RunOutcome::Skipped
        };
        runs.push(ConfigRun {
            config: *config,
            outcome,
        });
    }

    runs
}
