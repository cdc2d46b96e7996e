//! Invocation modes and the execution plan they resolve to.
//!
//! Everything here is pure argument interpretation; usage errors are raised
//! before any harness is touched.

use std::path::PathBuf;

use super::config::{ConfigurationMatrix, MatrixSpec};
use crate::core::schema::BenchConfig;
use crate::{BenchError, BenchResult};

/// Which configs to benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every config of the tier table.
    Full,
    /// One representative config per tier.
    Quick,
    /// Exactly one config.
    Single(BenchConfig),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Full => "full",
            Mode::Quick => "quick",
            Mode::Single(_) => "single",
        }
    }
}

/// Raw mode selection as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub quick: bool,
    /// Values following `--single`, unparsed.
    pub single: Option<Vec<String>>,
    pub collect_only: bool,
    pub output: Option<PathBuf>,
}

/// What a single invocation will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub mode: Mode,
    pub configs: ConfigurationMatrix,
    /// False only in collect-only mode.
    pub execute: bool,
    /// Where the table goes; stdout when `None`.
    pub output: Option<PathBuf>,
}

fn parse_positive(name: &str, raw: &str) -> BenchResult<u64> {
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(BenchError::Usage(format!(
            "{name} must be a positive integer (got '{raw}')"
        ))),
    }
}

/// Resolve the mode selector, validating `--single` values.
pub fn parse_mode(quick: bool, single: Option<&[String]>) -> BenchResult<Mode> {
    match (quick, single) {
        (true, Some(_)) => Err(BenchError::Usage(
            "--quick and --single cannot be combined".into(),
        )),
        (true, None) => Ok(Mode::Quick),
        (false, None) => Ok(Mode::Full),
        (false, Some([lanes, iterations])) => {
            let lanes = parse_positive("LANES", lanes)?;
            let iterations = parse_positive("ITERATIONS", iterations)?;
            Ok(Mode::Single(BenchConfig::new(lanes, iterations)))
        }
        (false, Some(values)) => Err(BenchError::Usage(format!(
            "--single takes both LANES and ITERATIONS (got {} value{})",
            values.len(),
            if values.len() == 1 { "" } else { "s" }
        ))),
    }
}

impl ExecutionPlan {
    pub fn new(
        mode: Mode,
        spec: &MatrixSpec,
        collect_only: bool,
        output: Option<PathBuf>,
    ) -> Self {
        let configs = match mode {
            Mode::Full => spec.expand(),
            Mode::Quick => spec.quick_matrix(),
            Mode::Single(config) => ConfigurationMatrix::single(config),
        };
        ExecutionPlan {
            mode,
            configs,
            execute: !collect_only,
            output,
        }
    }
}

/// Turn a raw request into a plan against the given tier table.
pub fn build_plan(request: PlanRequest, spec: &MatrixSpec) -> BenchResult<ExecutionPlan> {
    let mode = parse_mode(request.quick, request.single.as_deref())?;
    Ok(ExecutionPlan::new(
        mode,
        spec,
        request.collect_only,
        request.output,
    ))
}
