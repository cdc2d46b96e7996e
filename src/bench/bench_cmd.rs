//! The sweep command: run the plan, collect timings, render the table.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::backend::Harness;
use crate::core::env::EnvironmentInfo;
use crate::core::schema::{Phase, ResultRecord, RunOutcome, StoredRecord};
use crate::report::{Report, TableMeta, format_time, write_report};
use crate::storage::{CriterionStore, CsvExporter, JsonlWriter};
use crate::BenchResult;

use super::plan::ExecutionPlan;
use super::runner::{ConfigRun, run_configs};

/// Where collected results go besides the table.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Append one JSON line per config
    pub jsonl: Option<PathBuf>,
    /// Export a CSV of this sweep's records
    pub csv: Option<PathBuf>,
    pub meta: TableMeta,
    /// Workspace inspected for environment info in stored records
    pub workspace: PathBuf,
}

/// Everything a sweep produced.
#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub runs: Vec<ConfigRun>,
    /// One record per planned config, in plan order
    pub records: Vec<ResultRecord>,
    pub report: String,
}

impl SweepSummary {
    pub fn failed(&self) -> impl Iterator<Item = &ConfigRun> {
        self.runs.iter().filter(|r| r.outcome.is_failed())
    }

    pub fn absent(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|r| r.is_absent())
    }
}

/// Run and collect without writing anything.
pub fn run_sweep<H: Harness + ?Sized>(
    plan: &ExecutionPlan,
    harness: &H,
    store: &CriterionStore,
    meta: &TableMeta,
) -> SweepSummary {
    info!(
        mode = plan.mode.name(),
        configs = plan.configs.len(),
        execute = plan.execute,
        "starting sweep"
    );

    let runs = run_configs(harness, &plan.configs, plan.execute);
    let records = store.collect_all(&plan.configs);

    for record in &records {
        let phases: Vec<String> = Phase::ALL
            .iter()
            .map(|p| match record.timings.get(*p).estimate() {
                Some(e) => format!("{}={}", p.key(), format_time(e.as_millis())),
                None => format!("{}=absent", p.key()),
            })
            .collect();
        info!("{}: {}", record.config, phases.join(", "));
    }

    let report = Report::new(records.clone()).with_meta(meta.clone()).render();
    SweepSummary {
        runs,
        records,
        report,
    }
}

fn stored_records(
    bench: &str,
    summary: &SweepSummary,
    env: &EnvironmentInfo,
) -> Vec<StoredRecord> {
    summary
        .records
        .iter()
        .zip(&summary.runs)
        .map(|(record, run)| StoredRecord::new(bench, record, run.outcome.clone(), env.clone()))
        .collect()
}

fn log_summary(summary: &SweepSummary) {
    let failed: Vec<_> = summary.failed().collect();
    for run in &failed {
        if let RunOutcome::Failed { cause } = &run.outcome {
            warn!(config = %run.config, %cause, "harness failed");
        }
    }
    let absent: Vec<_> = summary.absent().collect();
    for record in &absent {
        warn!(config = %record.config, "no results found");
    }
    info!(
        rows = summary.records.len(),
        failed = failed.len(),
        absent = absent.len(),
        "sweep complete"
    );
}

/// Run the full command: sweep, write the table, persist records.
///
/// Config failures and missing artifacts are reported but never fail the
/// command; only I/O on the outputs does.
pub fn run<H: Harness + ?Sized>(
    plan: &ExecutionPlan,
    harness: &H,
    store: &CriterionStore,
    options: &SweepOptions,
) -> BenchResult<SweepSummary> {
    let summary = run_sweep(plan, harness, store, &options.meta);

    write_report(&summary.report, plan.output.as_deref())?;
    if let Some(path) = &plan.output {
        info!(path = %path.display(), "table written");
    }

    if options.jsonl.is_some() || options.csv.is_some() {
        let env = EnvironmentInfo::detect(&options.workspace);
        let stored = stored_records(store.bench(), &summary, &env);

        if let Some(path) = &options.jsonl {
            let writer = JsonlWriter::new(path);
            writer.append_all(&stored)?;
            info!(
                path = %path.display(),
                appended = stored.len(),
                total = writer.count()?,
                "records appended"
            );
        }
        if let Some(path) = &options.csv {
            CsvExporter::new().export(&stored, path)?;
            info!(path = %path.display(), "csv written");
        }
    }

    log_summary(&summary);
    Ok(summary)
}
