//! Harness abstraction for the external benchmark process.
//!
//! The runner only sees the `Harness` trait: parameters in, exit status out.
//! Timings travel out of band through the Criterion output tree.

pub mod command;
pub mod mock;
pub mod traits;

// Re-export key types
pub use command::{CommandConfig, CommandHarness, DEFAULT_BENCH, DEFAULT_HARNESS_COMMAND};
pub use mock::{MockConfig, MockHarness, MockTimings};
pub use traits::{Harness, Invocation};
