//! Sweep control: the configuration matrix, the execution plan, and the
//! command that drives the harness and renders the results.

pub mod bench_cmd;
pub mod config;
pub mod plan;
pub mod runner;

pub use bench_cmd::{SweepOptions, SweepSummary, run, run_sweep};
pub use config::{ConfigurationMatrix, MatrixSpec, Tier, load_matrix_spec};
pub use plan::{ExecutionPlan, Mode, PlanRequest, build_plan};
pub use runner::{ConfigRun, run_configs};
