#![forbid(unsafe_code)]

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use iterf_bench::backend::{CommandConfig, CommandHarness, DEFAULT_BENCH, DEFAULT_HARNESS_COMMAND};
use iterf_bench::bench::{self, MatrixSpec, PlanRequest, SweepOptions, build_plan, load_matrix_spec};
use iterf_bench::report::TableMeta;
use iterf_bench::storage::CriterionStore;
use iterf_bench::{BenchError, BenchResult};

#[derive(Parser, Debug)]
#[command(name = "iterf-bench")]
#[command(about = "Run the iterated f benchmark matrix and render a LaTeX table", long_about = None)]
struct Cli {
    /// Run only three representative configs
    #[arg(long)]
    quick: bool,

    /// Run a single config
    #[arg(
        long,
        num_args = 1..,
        value_names = ["LANES", "ITERATIONS"],
        allow_negative_numbers = true
    )]
    single: Option<Vec<String>>,

    /// Skip running benchmarks, only collect existing results
    #[arg(long, visible_alias = "skip-run")]
    collect_only: bool,

    /// Write the LaTeX table to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Workspace the harness runs in
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Criterion output directory (defaults to <workspace>/target/criterion)
    #[arg(long)]
    criterion_dir: Option<PathBuf>,

    /// Bench target name, also the prefix of its Criterion groups
    #[arg(long, default_value = DEFAULT_BENCH)]
    bench: String,

    /// Harness command template (placeholders: {lanes},{iterations},{bench})
    #[arg(long, default_value = DEFAULT_HARNESS_COMMAND)]
    harness: String,

    /// Append `-C target-cpu=native` to RUSTFLAGS for the harness
    #[arg(long)]
    target_cpu_native: bool,

    /// Matrix override file (TOML, or YAML by extension)
    #[arg(long)]
    matrix: Option<PathBuf>,

    /// Append collected records to this JSONL file
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// Export collected records to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Table caption
    #[arg(long)]
    caption: Option<String>,

    /// Table label
    #[arg(long)]
    label: Option<String>,

    /// Enable verbose logging (or set ITERF_BENCH_LOG)
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("ITERF_BENCH_LOG").unwrap_or_else(|_| {
        if verbose { "iterf_bench=debug".to_string() } else { "iterf_bench=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn run(cli: Cli) -> BenchResult<()> {
    let spec = match &cli.matrix {
        Some(path) => load_matrix_spec(path)?,
        None => MatrixSpec::default(),
    };
    let plan = build_plan(
        PlanRequest {
            quick: cli.quick,
            single: cli.single,
            collect_only: cli.collect_only,
            output: cli.output,
        },
        &spec,
    )?;

    let harness = CommandHarness::new(
        CommandConfig::new(&cli.workspace)
            .with_template(cli.harness)
            .with_bench(cli.bench.clone())
            .with_target_cpu_native(cli.target_cpu_native),
    );
    let store = match cli.criterion_dir {
        Some(dir) => CriterionStore::new(dir, cli.bench),
        None => CriterionStore::for_workspace(&cli.workspace, cli.bench),
    };

    harness.check_template()?;

    let defaults = TableMeta::default();
    let options = SweepOptions {
        jsonl: cli.jsonl,
        csv: cli.csv,
        meta: TableMeta::new(
            cli.caption.unwrap_or(defaults.caption),
            cli.label.unwrap_or(defaults.label),
        )?,
        workspace: cli.workspace,
    };

    bench::run(&plan, &harness, &store, &options)?;
    Ok(())
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        if let BenchError::Usage(_) = e {
            eprintln!("\nFor more information, try '--help'.");
            std::process::exit(2);
        }
        std::process::exit(1);
    }
}
