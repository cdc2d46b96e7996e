//! Storage layer: reading harness output and persisting collected results.

pub mod criterion;
pub mod csv;
pub mod jsonl;

// Re-export key types
pub use self::criterion::CriterionStore;
pub use self::csv::{CSV_HEADERS, CsvExporter};
pub use self::jsonl::JsonlWriter;
