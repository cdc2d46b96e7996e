//! Core types for iterf-bench.
//!
//! `schema` holds the benchmark data model (configs, phase timings, run
//! outcomes); `env` captures the host details stored next to results.

pub mod env;
pub mod schema;

// Re-export key types for convenience
pub use env::EnvironmentInfo;
pub use schema::{
    AbsenceReason, BenchConfig, ConfidenceInterval, Estimate, Measurement, Phase, PhaseTimings,
    ResultRecord, RunOutcome, SCHEMA_VERSION, StoredRecord,
};
