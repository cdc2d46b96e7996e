//! Mock harness for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::BenchResult;
use crate::core::schema::{BenchConfig, Estimate, Phase};
use crate::storage::criterion::CriterionStore;

use super::traits::{Harness, Invocation};

/// Phase timings a mock run writes, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockTimings {
    pub witness_ms: f64,
    pub proof_ms: f64,
    pub verify_ms: f64,
}

impl MockTimings {
    pub fn new(witness_ms: f64, proof_ms: f64, verify_ms: f64) -> Self {
        MockTimings {
            witness_ms,
            proof_ms,
            verify_ms,
        }
    }

    fn for_phase(&self, phase: Phase) -> f64 {
        match phase {
            Phase::WitnessGeneration => self.witness_ms,
            Phase::ProofGeneration => self.proof_ms,
            Phase::Verification => self.verify_ms,
        }
    }
}

impl Default for MockTimings {
    fn default() -> Self {
        MockTimings::new(10.0, 90.0, 5.0)
    }
}

/// Configuration for mock harness behaviour.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Name to report
    pub name: String,
    /// Configs whose invocation exits non-zero
    pub failing: HashSet<BenchConfig>,
    /// Configs whose process cannot be spawned
    pub unspawnable: HashSet<BenchConfig>,
    /// Where successful runs write their estimates, if anywhere
    pub store: Option<CriterionStore>,
    /// Timings written for configs without an explicit entry
    pub default_timings: MockTimings,
    /// Per-config timings
    pub timings: HashMap<BenchConfig, MockTimings>,
}

impl MockConfig {
    /// Create a new mock config with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        MockConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Make the invocation for `config` exit with status 1.
    pub fn failing(mut self, config: BenchConfig) -> Self {
        self.failing.insert(config);
        self
    }

    /// Make the invocation for `config` fail to start.
    pub fn unspawnable(mut self, config: BenchConfig) -> Self {
        self.unspawnable.insert(config);
        self
    }

    /// Write estimates for every successful run into `store`.
    pub fn writing_to(mut self, store: CriterionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Timings for a specific config.
    pub fn with_timings(mut self, config: BenchConfig, timings: MockTimings) -> Self {
        self.timings.insert(config, timings);
        self
    }
}

/// Mock harness for unit testing.
///
/// Records every invocation and, when given a store, writes Criterion-shaped
/// estimates the way a real run would.
pub struct MockHarness {
    config: MockConfig,
    calls: Mutex<Vec<BenchConfig>>,
}

impl MockHarness {
    /// Create a new mock harness with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        MockHarness {
            config,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock harness that succeeds without writing anything.
    pub fn default_mock() -> Self {
        Self::new(MockConfig::new("mock"))
    }

    /// Configs invoked so far, in call order.
    pub fn calls(&self) -> Vec<BenchConfig> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Harness for MockHarness {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn invoke(&self, config: &BenchConfig) -> BenchResult<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(*config);

        if self.config.unspawnable.contains(config) {
            return Err(crate::BenchError::Message(
                "mock harness could not be started".into(),
            ));
        }
        if self.config.failing.contains(config) {
            return Ok(Invocation::failed(
                Some(1),
                format!("mock harness failed for {config}\n"),
            ));
        }
        if let Some(store) = &self.config.store {
            let timings = self
                .config
                .timings
                .get(config)
                .copied()
                .unwrap_or(self.config.default_timings);
            for phase in Phase::ALL {
                store.write_phase(
                    config,
                    phase,
                    &Estimate::from_millis(timings.for_phase(phase)),
                )?;
            }
        }
        Ok(Invocation::succeeded(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Measurement;

    #[test]
    fn test_mock_harness_default() {
        let harness = MockHarness::default_mock();
        assert_eq!(harness.name(), "mock");
        let inv = harness.invoke(&BenchConfig::new(1, 8)).unwrap();
        assert!(inv.success);
        assert_eq!(harness.calls(), vec![BenchConfig::new(1, 8)]);
    }

    #[test]
    fn test_mock_harness_failing_and_unspawnable() {
        let bad = BenchConfig::new(4, 16);
        let gone = BenchConfig::new(16, 4);
        let harness = MockHarness::new(MockConfig::new("mock").failing(bad).unspawnable(gone));

        let inv = harness.invoke(&bad).unwrap();
        assert!(!inv.success);
        assert_eq!(inv.exit_code, Some(1));
        assert!(harness.invoke(&gone).is_err());
        assert_eq!(harness.calls(), vec![bad, gone]);
    }

    #[test]
    fn test_mock_harness_writes_estimates() {
        let dir = tempfile::tempdir().unwrap();
        let store = CriterionStore::new(dir.path(), "iterated_f");
        let config = BenchConfig::new(4, 2048);
        let harness = MockHarness::new(
            MockConfig::new("mock")
                .writing_to(store.clone())
                .with_timings(config, MockTimings::new(1200.0, 4500.0, 30.0)),
        );

        harness.invoke(&config).unwrap();
        let record = store.collect(&config);
        assert!(record.timings.is_complete());
        assert!(matches!(record.timings.verify, Measurement::Present(e) if e.as_millis() == 30.0));
    }
}
