//! Harness trait: the external process that actually benchmarks one config.

use serde::{Deserialize, Serialize};

use crate::BenchResult;
use crate::core::schema::BenchConfig;

/// How a harness invocation ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Whether the harness exited successfully
    pub success: bool,
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,
    /// Captured standard error
    pub stderr: String,
    /// Wall-clock time of the invocation in milliseconds
    pub elapsed_ms: u64,
}

impl Invocation {
    pub fn succeeded(elapsed_ms: u64) -> Self {
        Invocation {
            success: true,
            exit_code: Some(0),
            stderr: String::new(),
            elapsed_ms,
        }
    }

    pub fn failed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Invocation {
            success: false,
            exit_code,
            stderr: stderr.into(),
            elapsed_ms: 0,
        }
    }
}

/// A benchmark harness driven one config at a time.
///
/// The harness only reports whether it ran; its timings are written out of
/// band to a location derived from the config and read back by the collector.
pub trait Harness: Send + Sync {
    /// Returns the harness name (e.g., "cargo-bench", "mock").
    fn name(&self) -> &str;

    /// Run the benchmark for `config` and block until it finishes.
    ///
    /// # Returns
    /// `Ok` with the exit details once the process ran, successfully or not.
    /// `Err` when the process could not be started at all.
    fn invoke(&self, config: &BenchConfig) -> BenchResult<Invocation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_constructors() {
        let ok = Invocation::succeeded(12);
        assert!(ok.success);
        assert_eq!(ok.exit_code, Some(0));
        assert_eq!(ok.elapsed_ms, 12);

        let bad = Invocation::failed(Some(101), "error: could not compile");
        assert!(!bad.success);
        assert_eq!(bad.exit_code, Some(101));
        assert!(bad.stderr.contains("could not compile"));
    }
}
