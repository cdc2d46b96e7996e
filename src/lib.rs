pub mod backend;
pub mod bench;
pub mod core;
pub mod report;
pub mod storage;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Malformed invocation, detected before any harness run.
    #[error("usage: {0}")]
    Usage(String),
    #[error("{0}")]
    Message(String),
}

impl BenchError {
    pub fn is_usage(&self) -> bool {
        matches!(self, BenchError::Usage(_))
    }
}

pub type BenchResult<T> = Result<T, BenchError>;

// Re-export the types most callers need
pub use crate::bench::config::{ConfigurationMatrix, MatrixSpec, Tier};
pub use crate::bench::plan::{ExecutionPlan, Mode};
pub use crate::core::schema::{
    AbsenceReason, BenchConfig, Estimate, Measurement, Phase, PhaseTimings, ResultRecord,
    RunOutcome,
};
