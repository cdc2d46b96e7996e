//! Reads per-phase timings out of a Criterion output tree.
//!
//! Layout written by the harness:
//!
//! ```text
//! <root>/<bench>_<phase group>/<bench id>[_<suffix>]/new/estimates.json
//! ```
//!
//! Anything missing or unreadable becomes an absent measurement for that
//! phase; collection itself never fails.

use std::path::{Path, PathBuf};

use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, warn};

use crate::bench::config::ConfigurationMatrix;
use crate::core::schema::{
    AbsenceReason, BenchConfig, ConfidenceInterval, Estimate, Measurement, Phase, PhaseTimings,
    ResultRecord,
};
use crate::{BenchError, BenchResult};

/// Criterion output tree for one bench target.
#[derive(Debug, Clone)]
pub struct CriterionStore {
    root: PathBuf,
    bench: String,
}

impl CriterionStore {
    pub fn new(root: impl Into<PathBuf>, bench: impl Into<String>) -> Self {
        CriterionStore {
            root: root.into(),
            bench: bench.into(),
        }
    }

    /// `<workspace>/target/criterion`, where `cargo bench` writes by default.
    pub fn for_workspace(workspace: &Path, bench: impl Into<String>) -> Self {
        Self::new(workspace.join("target").join("criterion"), bench)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bench(&self) -> &str {
        &self.bench
    }

    /// Directory of the Criterion group holding `phase`.
    pub fn group_dir(&self, phase: Phase) -> PathBuf {
        self.root
            .join(format!("{}_{}", self.bench, phase.group_suffix()))
    }

    /// Find the benchmark directory for `config` within the `phase` group.
    ///
    /// When several directories match, the lexicographically smallest wins.
    pub fn find_bench_dir(&self, phase: Phase, config: &BenchConfig) -> Option<PathBuf> {
        let entries = std::fs::read_dir(self.group_dir(phase)).ok()?;
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| matches_bench_id(name, config))
            .collect();
        names.sort();
        names
            .into_iter()
            .next()
            .map(|name| self.group_dir(phase).join(name))
    }

    /// Read one phase for one config.
    pub fn read_phase(&self, phase: Phase, config: &BenchConfig) -> Measurement {
        let Some(dir) = self.find_bench_dir(phase, config) else {
            debug!(%config, phase = phase.key(), "no benchmark directory");
            return Measurement::Absent(AbsenceReason::MissingArtifact);
        };
        let estimates = dir.join("new").join("estimates.json");
        if !estimates.is_file() {
            debug!(path = %estimates.display(), "estimates.json missing");
            return Measurement::Absent(AbsenceReason::MissingArtifact);
        }
        let measurement = match std::fs::read_to_string(&estimates) {
            Ok(s) => parse_estimates(&s),
            Err(e) => Measurement::Absent(AbsenceReason::Malformed(e.to_string())),
        };
        if let Measurement::Absent(reason) = &measurement {
            warn!(path = %estimates.display(), "unusable estimates: {reason}");
        }
        measurement
    }

    /// Collect all three phases for `config`.
    pub fn collect(&self, config: &BenchConfig) -> ResultRecord {
        let mut timings = PhaseTimings::absent(AbsenceReason::MissingArtifact);
        for phase in Phase::ALL {
            timings.set(phase, self.read_phase(phase, config));
        }
        ResultRecord::new(*config, timings)
    }

    /// Collect every config of the matrix, in matrix order.
    pub fn collect_all(&self, matrix: &ConfigurationMatrix) -> Vec<ResultRecord> {
        info!(root = %self.root.display(), configs = matrix.len(), "collecting results");
        matrix.iter().map(|config| self.collect(config)).collect()
    }

    /// Write an `estimates.json` the way the harness lays it out.
    ///
    /// Used to build fixtures and by the mock harness.
    pub fn write_phase(
        &self,
        config: &BenchConfig,
        phase: Phase,
        estimate: &Estimate,
    ) -> BenchResult<PathBuf> {
        let dir = self.group_dir(phase).join(config.bench_id()).join("new");
        std::fs::create_dir_all(&dir)
            .map_err(|e| BenchError::Message(format!("failed to create directory: {e}")))?;
        let path = dir.join("estimates.json");
        let bytes = serde_json::to_vec_pretty(&estimates_json(estimate))
            .map_err(|e| BenchError::Message(format!("failed to serialize estimates: {e}")))?;
        std::fs::write(&path, bytes)
            .map_err(|e| BenchError::Message(format!("failed to write estimates: {e}")))?;
        Ok(path)
    }
}

/// Whether a Criterion directory name belongs to `config`.
///
/// Accepts the bare id or the id followed by `_<suffix>`. A single-lane id
/// is a prefix of every multi-lane id with the same iteration count, so for
/// one lane a `lanes_` suffix is rejected.
pub fn matches_bench_id(name: &str, config: &BenchConfig) -> bool {
    let id = config.bench_id();
    if name == id {
        return true;
    }
    match name.strip_prefix(id.as_str()).and_then(|r| r.strip_prefix('_')) {
        Some(rest) => !(config.lanes == 1 && rest.starts_with("lanes_")),
        None => false,
    }
}

fn field_f64(obj: &JsonValue, key: &str) -> Option<f64> {
    obj.get(key).and_then(|v| v.as_f64())
}

/// Extract the mean estimate (nanoseconds) from an `estimates.json` body.
pub fn parse_estimates(contents: &str) -> Measurement {
    let v: JsonValue = match serde_json::from_str(contents) {
        Ok(v) => v,
        Err(e) => return Measurement::Absent(AbsenceReason::Malformed(e.to_string())),
    };
    let Some(mean) = v.get("mean") else {
        return Measurement::Absent(AbsenceReason::MissingField("mean".into()));
    };
    let Some(point_ns) = field_f64(mean, "point_estimate") else {
        return Measurement::Absent(AbsenceReason::MissingField(
            "mean.point_estimate".into(),
        ));
    };
    if !point_ns.is_finite() || point_ns < 0.0 {
        return Measurement::Absent(AbsenceReason::Malformed(format!(
            "invalid point estimate {point_ns}"
        )));
    }
    let confidence = mean.get("confidence_interval").and_then(|ci| {
        Some(ConfidenceInterval {
            level: field_f64(ci, "confidence_level")?,
            lower_ns: field_f64(ci, "lower_bound")?,
            upper_ns: field_f64(ci, "upper_bound")?,
        })
    });
    Measurement::Present(Estimate {
        point_ns,
        standard_error_ns: field_f64(mean, "standard_error"),
        confidence,
    })
}

/// Criterion-shaped JSON for an estimate; only `mean` is populated.
pub fn estimates_json(estimate: &Estimate) -> JsonValue {
    let ci = estimate.confidence.unwrap_or(ConfidenceInterval {
        level: 0.95,
        lower_ns: estimate.point_ns,
        upper_ns: estimate.point_ns,
    });
    json!({
        "mean": {
            "confidence_interval": {
                "confidence_level": ci.level,
                "lower_bound": ci.lower_ns,
                "upper_bound": ci.upper_ns,
            },
            "point_estimate": estimate.point_ns,
            "standard_error": estimate.standard_error_ns.unwrap_or(0.0),
        }
    })
}
