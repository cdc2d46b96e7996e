//! Data model shared by the sweep, the collector and the reporter.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::env::EnvironmentInfo;

/// One point of the benchmark matrix.
///
/// Identity is the `(lanes, iterations)` pair; `total_ops` is derived and
/// only used for reporting and matrix design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchConfig {
    pub lanes: u64,
    pub iterations: u64,
}

impl BenchConfig {
    pub const fn new(lanes: u64, iterations: u64) -> Self {
        BenchConfig { lanes, iterations }
    }

    /// Reject configs the harness cannot run.
    pub fn validate(&self) -> Result<(), String> {
        if self.lanes == 0 {
            return Err(format!("lanes must be a positive integer (got {})", self.lanes));
        }
        if self.iterations == 0 {
            return Err(format!(
                "iterations must be a positive integer (got {})",
                self.iterations
            ));
        }
        Ok(())
    }

    /// Total applications of f across all lanes.
    pub fn total_ops(&self) -> u64 {
        self.lanes.saturating_mul(self.iterations)
    }

    /// Benchmark id the harness derives from this config.
    ///
    /// Single-lane runs omit the lane component.
    pub fn bench_id(&self) -> String {
        if self.lanes == 1 {
            format!("iterations_{}", self.iterations)
        } else {
            format!("iterations_{}_lanes_{}", self.iterations, self.lanes)
        }
    }
}

impl fmt::Display for BenchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lanes={}, iterations={}", self.lanes, self.iterations)
    }
}

/// The three timed phases of a proving run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    WitnessGeneration,
    ProofGeneration,
    Verification,
}

impl Phase {
    /// Report column order.
    pub const ALL: [Phase; 3] = [
        Phase::WitnessGeneration,
        Phase::ProofGeneration,
        Phase::Verification,
    ];

    /// Suffix of the Criterion benchmark group holding this phase.
    pub fn group_suffix(&self) -> &'static str {
        match self {
            Phase::WitnessGeneration => "witness_generation",
            Phase::ProofGeneration => "proof_generation",
            Phase::Verification => "proof_verification",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::WitnessGeneration => "Witness Gen",
            Phase::ProofGeneration => "Proof Gen",
            Phase::Verification => "Verification",
        }
    }

    /// Short key used in logs and flat exports.
    pub fn key(&self) -> &'static str {
        match self {
            Phase::WitnessGeneration => "witness",
            Phase::ProofGeneration => "proof",
            Phase::Verification => "verify",
        }
    }
}

/// Confidence range reported alongside a point estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower_ns: f64,
    pub upper_ns: f64,
}

/// A measured phase duration, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub point_ns: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_error_ns: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceInterval>,
}

impl Estimate {
    pub fn from_nanos(point_ns: f64) -> Self {
        Estimate {
            point_ns,
            standard_error_ns: None,
            confidence: None,
        }
    }

    pub fn from_millis(ms: f64) -> Self {
        Self::from_nanos(ms * 1_000_000.0)
    }

    pub fn as_millis(&self) -> f64 {
        self.point_ns / 1_000_000.0
    }
}

/// Why a phase has no measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceReason {
    /// No artifact for this config and phase.
    MissingArtifact,
    /// The artifact exists but could not be read or parsed.
    Malformed(String),
    /// The artifact parsed but lacks the timing field.
    MissingField(String),
}

impl fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsenceReason::MissingArtifact => write!(f, "no artifact"),
            AbsenceReason::Malformed(e) => write!(f, "malformed artifact: {e}"),
            AbsenceReason::MissingField(field) => write!(f, "missing field `{field}`"),
        }
    }
}

/// Timing for one phase: either measured or explicitly absent.
///
/// Absence is never encoded as a zero duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Present(Estimate),
    Absent(AbsenceReason),
}

impl Measurement {
    pub fn estimate(&self) -> Option<&Estimate> {
        match self {
            Measurement::Present(e) => Some(e),
            Measurement::Absent(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Measurement::Present(_))
    }
}

/// Timings for the three phases of one config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub witness: Measurement,
    pub proof: Measurement,
    pub verify: Measurement,
}

impl PhaseTimings {
    /// All three phases absent for the same reason.
    pub fn absent(reason: AbsenceReason) -> Self {
        PhaseTimings {
            witness: Measurement::Absent(reason.clone()),
            proof: Measurement::Absent(reason.clone()),
            verify: Measurement::Absent(reason),
        }
    }

    pub fn get(&self, phase: Phase) -> &Measurement {
        match phase {
            Phase::WitnessGeneration => &self.witness,
            Phase::ProofGeneration => &self.proof,
            Phase::Verification => &self.verify,
        }
    }

    pub fn set(&mut self, phase: Phase, measurement: Measurement) {
        match phase {
            Phase::WitnessGeneration => self.witness = measurement,
            Phase::ProofGeneration => self.proof = measurement,
            Phase::Verification => self.verify = measurement,
        }
    }

    pub fn is_complete(&self) -> bool {
        Phase::ALL.iter().all(|p| self.get(*p).is_present())
    }

    pub fn is_absent(&self) -> bool {
        Phase::ALL.iter().all(|p| !self.get(*p).is_present())
    }
}

/// One report row: a config and whatever timing could be collected for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub config: BenchConfig,
    pub timings: PhaseTimings,
}

impl ResultRecord {
    pub fn new(config: BenchConfig, timings: PhaseTimings) -> Self {
        ResultRecord { config, timings }
    }

    pub fn is_absent(&self) -> bool {
        self.timings.is_absent()
    }
}

/// Result of asking the harness to run one config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Executed { elapsed_ms: u64 },
    Failed { cause: String },
    Skipped,
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Executed { .. } => "executed",
            RunOutcome::Failed { .. } => "failed",
            RunOutcome::Skipped => "skipped",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Schema version of persisted records
pub const SCHEMA_VERSION: u32 = 1;

/// A collected result as persisted to JSONL/CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// ISO 8601 timestamp of collection
    pub timestamp: String,

    /// Bench target the timings came from
    pub bench: String,

    pub lanes: u64,
    pub iterations: u64,
    pub total_ops: u64,

    /// What the runner did for this config in the same invocation
    pub run: RunOutcome,

    pub timings: PhaseTimings,

    pub env: EnvironmentInfo,
}

impl StoredRecord {
    pub fn new(
        bench: impl Into<String>,
        record: &ResultRecord,
        run: RunOutcome,
        env: EnvironmentInfo,
    ) -> Self {
        let timestamp = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        StoredRecord {
            schema_version: SCHEMA_VERSION,
            timestamp,
            bench: bench.into(),
            lanes: record.config.lanes,
            iterations: record.config.iterations,
            total_ops: record.config.total_ops(),
            run,
            timings: record.timings.clone(),
            env,
        }
    }

    pub fn config(&self) -> BenchConfig {
        BenchConfig::new(self.lanes, self.iterations)
    }

    pub fn result(&self) -> ResultRecord {
        ResultRecord::new(self.config(), self.timings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_id_single_lane_omits_lanes() {
        assert_eq!(BenchConfig::new(1, 8192).bench_id(), "iterations_8192");
        assert_eq!(
            BenchConfig::new(4, 2048).bench_id(),
            "iterations_2048_lanes_4"
        );
    }

    #[test]
    fn test_total_ops() {
        assert_eq!(BenchConfig::new(16, 512).total_ops(), 8192);
        assert_eq!(BenchConfig::new(u64::MAX, 2).total_ops(), u64::MAX);
    }

    #[test]
    fn test_identity_is_the_pair() {
        // Same total work, different configs.
        assert_ne!(BenchConfig::new(4, 2048), BenchConfig::new(1, 8192));
        assert_eq!(BenchConfig::new(4, 2048), BenchConfig::new(4, 2048));
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(BenchConfig::new(0, 10).validate().is_err());
        assert!(BenchConfig::new(1, 0).validate().is_err());
        assert!(BenchConfig::new(1, 1).validate().is_ok());
    }

    #[test]
    fn test_absent_timings() {
        let mut timings = PhaseTimings::absent(AbsenceReason::MissingArtifact);
        assert!(timings.is_absent());
        assert!(!timings.is_complete());

        timings.set(
            Phase::ProofGeneration,
            Measurement::Present(Estimate::from_millis(4.5)),
        );
        assert!(!timings.is_absent());
        assert!(!timings.is_complete());
        assert_eq!(
            timings.get(Phase::ProofGeneration).estimate().map(|e| e.as_millis()),
            Some(4.5)
        );
    }

    #[test]
    fn test_run_outcome_labels() {
        assert_eq!(RunOutcome::Skipped.label(), "skipped");
        assert!(RunOutcome::Failed { cause: "boom".into() }.is_failed());
        assert!(!RunOutcome::Executed { elapsed_ms: 3 }.is_failed());
    }
}
