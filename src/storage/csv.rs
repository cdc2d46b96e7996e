//! CSV export for collected results.

use std::io::Write;
use std::path::Path;

use crate::BenchError;
use crate::core::schema::{Measurement, Phase, StoredRecord};

/// CSV column headers in deterministic order.
pub const CSV_HEADERS: &[&str] = &[
    "timestamp",
    "bench",
    "lanes",
    "iterations",
    "total_ops",
    "run",
    "witness_mean_ms",
    "witness_stderr_ms",
    "proof_mean_ms",
    "proof_stderr_ms",
    "verify_mean_ms",
    "verify_stderr_ms",
    "absent_phases",
    "git_sha",
    "cpu_model",
];

/// CSV exporter for stored results.
///
/// Absent phases are written as empty cells and listed in `absent_phases`;
/// they are never written as zero.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Create a new CsvExporter.
    pub fn new() -> Self {
        CsvExporter
    }

    /// Export records to a CSV file, replacing it.
    pub fn export(&self, records: &[StoredRecord], output: &Path) -> Result<(), BenchError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BenchError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let file = std::fs::File::create(output)
            .map_err(|e| BenchError::Message(format!("failed to create file: {e}")))?;

        self.export_to_writer(records, file)
    }

    /// Export records to any writer implementing Write.
    pub fn export_to_writer<W: Write>(
        &self,
        records: &[StoredRecord],
        writer: W,
    ) -> Result<(), BenchError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| BenchError::Message(format!("failed to write CSV headers: {e}")))?;

        for record in records {
            csv_writer
                .write_record(record_to_row(record))
                .map_err(|e| BenchError::Message(format!("failed to write CSV row: {e}")))?;
        }

        csv_writer
            .flush()
            .map_err(|e| BenchError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }
}

fn mean_ms(m: &Measurement) -> String {
    m.estimate()
        .map(|e| format!("{:.3}", e.as_millis()))
        .unwrap_or_default()
}

fn stderr_ms(m: &Measurement) -> String {
    m.estimate()
        .and_then(|e| e.standard_error_ns)
        .map(|ns| format!("{:.3}", ns / 1_000_000.0))
        .unwrap_or_default()
}

fn record_to_row(record: &StoredRecord) -> Vec<String> {
    let mut row = vec![
        record.timestamp.clone(),
        record.bench.clone(),
        record.lanes.to_string(),
        record.iterations.to_string(),
        record.total_ops.to_string(),
        record.run.label().to_string(),
    ];
    for phase in Phase::ALL {
        let m = record.timings.get(phase);
        row.push(mean_ms(m));
        row.push(stderr_ms(m));
    }
    let absent: Vec<&str> = Phase::ALL
        .iter()
        .filter(|p| !record.timings.get(**p).is_present())
        .map(|p| p.key())
        .collect();
    row.push(absent.join(";"));
    row.push(record.env.git_sha.clone().unwrap_or_default());
    row.push(record.env.cpu_model.clone().unwrap_or_default());
    row
}
