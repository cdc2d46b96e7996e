//! End-to-end sweeps against a mock harness writing a real Criterion tree.

use iterf_bench::backend::{MockConfig, MockHarness, MockTimings};
use iterf_bench::bench::{self, ExecutionPlan, MatrixSpec, Mode, PlanRequest, SweepOptions};
use iterf_bench::core::schema::{BenchConfig, RunOutcome};
use iterf_bench::report::TableMeta;
use iterf_bench::storage::CriterionStore;

fn options(dir: &std::path::Path) -> SweepOptions {
    SweepOptions {
        jsonl: None,
        csv: None,
        meta: TableMeta::default(),
        workspace: dir.to_path_buf(),
    }
}

#[test]
fn test_full_sweep_has_a_row_per_config() {
    let dir = tempfile::tempdir().unwrap();
    let store = CriterionStore::for_workspace(dir.path(), "iterated_f");
    let harness = MockHarness::new(MockConfig::new("mock").writing_to(store.clone()));
    let plan = ExecutionPlan::new(Mode::Full, &MatrixSpec::default(), false, None);

    let summary = bench::run_sweep(&plan, &harness, &store, &TableMeta::default());

    assert_eq!(harness.calls().len(), 15);
    assert_eq!(summary.records.len(), 15);
    assert!(summary.records.iter().all(|r| r.timings.is_complete()));
    // rows follow tier order
    assert_eq!(summary.records[0].config, BenchConfig::new(1, 8192));
    assert_eq!(summary.records[5].config, BenchConfig::new(4, 2048));
    assert_eq!(summary.records[14].config, BenchConfig::new(16, 8192));
}

#[test]
fn test_failing_config_still_yields_a_row() {
    let dir = tempfile::tempdir().unwrap();
    let store = CriterionStore::for_workspace(dir.path(), "iterated_f");
    let failing = BenchConfig::new(4, 2048);
    let harness = MockHarness::new(
        MockConfig::new("mock")
            .writing_to(store.clone())
            .failing(failing),
    );
    let plan = ExecutionPlan::new(Mode::Quick, &MatrixSpec::default(), false, None);

    let summary = bench::run_sweep(&plan, &harness, &store, &TableMeta::default());

    assert_eq!(harness.calls().len(), 3);
    assert!(summary.runs[1].outcome.is_failed());
    assert!(summary.records[1].is_absent());
    assert!(summary.records[2].timings.is_complete());
    assert!(
        summary
            .report
            .contains("4 & $2^{11}$ & $2^{13}$ & n/a & n/a & n/a \\\\")
    );
}

#[test]
fn test_collect_only_reads_previous_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let store = CriterionStore::for_workspace(dir.path(), "iterated_f");

    // First sweep writes artifacts.
    let writer = MockHarness::new(
        MockConfig::new("mock")
            .writing_to(store.clone())
            .with_timings(BenchConfig::new(16, 512), MockTimings::new(0.5, 80.0, 2.0)),
    );
    let plan = ExecutionPlan::new(Mode::Quick, &MatrixSpec::default(), false, None);
    let first = bench::run_sweep(&plan, &writer, &store, &TableMeta::default());

    // Second, collect-only, must not invoke anything and see the same data.
    let idle = MockHarness::default_mock();
    let plan = bench::build_plan(
        PlanRequest {
            quick: true,
            collect_only: true,
            ..Default::default()
        },
        &MatrixSpec::default(),
    )
    .unwrap();
    let second = bench::run_sweep(&plan, &idle, &store, &TableMeta::default());

    assert!(idle.calls().is_empty());
    assert!(second.runs.iter().all(|r| r.outcome == RunOutcome::Skipped));
    assert_eq!(first.records, second.records);
    assert_eq!(first.report, second.report);
    assert!(second.report.contains("500.0 $\\mu$s"));
}

#[test]
fn test_single_mode_runs_one_config() {
    let dir = tempfile::tempdir().unwrap();
    let store = CriterionStore::for_workspace(dir.path(), "iterated_f");
    let harness = MockHarness::new(MockConfig::new("mock").writing_to(store.clone()));
    let plan = bench::build_plan(
        PlanRequest {
            single: Some(vec!["2".into(), "3000".into()]),
            ..Default::default()
        },
        &MatrixSpec::default(),
    )
    .unwrap();

    let summary = bench::run(&plan, &harness, &store, &options(dir.path())).unwrap();

    assert_eq!(harness.calls(), vec![BenchConfig::new(2, 3000)]);
    assert_eq!(summary.records.len(), 1);
    assert!(summary.report.contains("\n2 & 3000 & 6000 & 10.0 ms & 90.0 ms & 5.0 ms \\\\\n"));
}

#[test]
fn test_invalid_single_is_rejected_before_any_run() {
    for values in [vec!["0", "10"], vec!["4", "-1"], vec!["4"], vec!["x", "1"]] {
        let request = PlanRequest {
            single: Some(values.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        };
        let err = bench::build_plan(request, &MatrixSpec::default()).unwrap_err();
        assert!(err.is_usage(), "expected usage error for {values:?}");
    }
}

#[test]
fn test_output_file_matches_rendered_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = CriterionStore::for_workspace(dir.path(), "iterated_f");
    let harness = MockHarness::new(MockConfig::new("mock").writing_to(store.clone()));
    let output = dir.path().join("paper").join("tables").join("iterf.tex");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();
    std::fs::write(&output, "stale").unwrap();

    let plan = ExecutionPlan::new(Mode::Quick, &MatrixSpec::default(), false, Some(output.clone()));
    let summary = bench::run(&plan, &harness, &store, &options(dir.path())).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, summary.report);
    assert!(written.starts_with("\\begin{table}[htbp]\n"));
}
