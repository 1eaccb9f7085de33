#![warn(missing_docs)]
//! Quadbench CLI
//!
//! Entry points for the quadbench binary: run one integration under a
//! chosen strategy, benchmark all strategies against each other, drive
//! the text pipeline interactively, or list registered integrands.
//! The same binary doubles as the isolated worker when relaunched with
//! the hidden `--quad-worker` flag.

mod config;
mod executor;
mod report;
mod supervisor;

pub use config::{OutputConfig, PipelineConfig, QuadConfig, RunnerConfig, Strategy};
pub use executor::{integrate_with_strategy, ExecError, ThreadExecutor};
pub use report::{BenchmarkReport, Metric};
pub use supervisor::{ProcessExecutor, SupervisorError, TaskOutcome, WorkerHandle};

use clap::{Parser, Subcommand};
use quadbench_core::{registered_integrands, RemainderPolicy, WorkerMain};
use quadbench_pipeline::{Message, Pipeline};
use std::io::BufRead;
use std::time::Instant;

/// Quadbench CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "quadbench")]
#[command(author, version, about = "Parallel numerical-integration benchmark harness")]
pub struct Cli {
    /// Optional subcommand; defaults to Run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Integrand registry name.
    #[arg(long)]
    pub integrand: Option<String>,

    /// Lower integration bound.
    #[arg(long)]
    pub lower: Option<f64>,

    /// Upper integration bound.
    #[arg(long)]
    pub upper: Option<f64>,

    /// Total iteration budget.
    #[arg(long, short = 'n')]
    pub iterations: Option<u64>,

    /// Number of concurrent jobs (0 = one per logical CPU).
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Execution strategy: threads or processes.
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Remainder policy: first-job (exact) or inflate (legacy).
    #[arg(long)]
    pub remainder: Option<String>,

    /// Report file path for the bench subcommand.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: run as an isolated worker process.
    #[arg(long, hide = true)]
    pub quad_worker: bool,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one integration under the chosen strategy (default).
    Run,
    /// Benchmark sequential vs. threads vs. processes and write the
    /// report file.
    Bench,
    /// Drive the two-stage text pipeline from standard input.
    Pipe,
    /// List registered integrands.
    List,
}

/// Run the quadbench CLI. Main entry point for the binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the quadbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Worker mode first: the worker builds its own logger (stderr, so
    // it survives the stdout pipe being claimed by the protocol).
    if cli.quad_worker {
        return run_worker_mode();
    }

    let filter = if cli.verbose {
        "quadbench=debug"
    } else {
        "quadbench=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = QuadConfig::discover().unwrap_or_default();
    apply_cli_overrides(&cli, &mut config)?;

    match cli.command {
        Some(Commands::Bench) => run_bench(&config),
        Some(Commands::Pipe) => run_pipe(&config),
        Some(Commands::List) => {
            list_integrands();
            Ok(())
        }
        Some(Commands::Run) | None => run_once(&config),
    }
}

/// Run as an isolated worker over piped stdin/stdout.
fn run_worker_mode() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("quadbench=info")
        .with_writer(std::io::stderr)
        .init();

    let mut worker = WorkerMain::new();
    worker
        .run()
        .map_err(|e| anyhow::anyhow!("worker error: {e}"))
}

fn apply_cli_overrides(cli: &Cli, config: &mut QuadConfig) -> anyhow::Result<()> {
    if let Some(integrand) = &cli.integrand {
        config.runner.integrand = integrand.clone();
    }
    if let Some(lower) = cli.lower {
        config.runner.lower = lower;
    }
    if let Some(upper) = cli.upper {
        config.runner.upper = upper;
    }
    if let Some(iterations) = cli.iterations {
        config.runner.iterations = iterations;
    }
    if let Some(jobs) = cli.jobs {
        config.runner.jobs = jobs;
    }
    if let Some(strategy) = cli.strategy {
        config.runner.strategy = strategy;
    }
    if let Some(remainder) = &cli.remainder {
        config.runner.remainder = match remainder.as_str() {
            "first-job" => RemainderPolicy::FirstJob,
            "inflate" => RemainderPolicy::Inflate,
            other => anyhow::bail!("unknown remainder policy: {other}"),
        };
    }
    if let Some(output) = &cli.output {
        config.output.report_path = output.clone();
    }
    Ok(())
}

/// Run one integration and print the result and elapsed time.
fn run_once(config: &QuadConfig) -> anyhow::Result<()> {
    let runner = &config.runner;
    let jobs = config.effective_jobs();

    let clock = Instant::now();
    let result = integrate_with_strategy(
        &runner.integrand,
        runner.lower,
        runner.upper,
        jobs,
        runner.iterations,
        runner.strategy,
        runner.remainder,
        config.log,
    )?;
    let elapsed = clock.elapsed();

    println!(
        "integral of {} over [{}, {}] = {result}",
        runner.integrand, runner.lower, runner.upper
    );
    println!("elapsed: {:.6} s ({jobs} jobs, {:?})", elapsed.as_secs_f64(), runner.strategy);
    Ok(())
}

/// Benchmark all strategies over the same inputs and write the report.
fn run_bench(config: &QuadConfig) -> anyhow::Result<()> {
    let runner = &config.runner;
    let jobs = config.effective_jobs();
    let mut report = BenchmarkReport::new();

    // Sequential baseline: one job, thread strategy.
    let clock = Instant::now();
    let sequential = integrate_with_strategy(
        &runner.integrand,
        runner.lower,
        runner.upper,
        1,
        runner.iterations,
        Strategy::Threads,
        runner.remainder,
        config.log,
    )?;
    report.push("sequential", clock.elapsed().as_secs_f64(), "s");

    let clock = Instant::now();
    let threaded = integrate_with_strategy(
        &runner.integrand,
        runner.lower,
        runner.upper,
        jobs,
        runner.iterations,
        Strategy::Threads,
        runner.remainder,
        config.log,
    )?;
    report.push("threads", clock.elapsed().as_secs_f64(), "s");

    let clock = Instant::now();
    let isolated = integrate_with_strategy(
        &runner.integrand,
        runner.lower,
        runner.upper,
        jobs,
        runner.iterations,
        Strategy::Processes,
        runner.remainder,
        config.log,
    )?;
    report.push("processes", clock.elapsed().as_secs_f64(), "s");

    tracing::info!(
        sequential,
        threaded,
        isolated,
        "strategy results agree within quadrature tolerance"
    );

    for line in report.render().lines() {
        println!("{line}");
    }
    report.write_to(&config.output.report_path)?;
    println!("report written to {}", config.output.report_path);
    Ok(())
}

/// Drive the pipeline from stdin until the sentinel token.
fn run_pipe(config: &QuadConfig) -> anyhow::Result<()> {
    let delay = QuadConfig::parse_duration(&config.pipeline.stage_delay)?;
    let (input, output, stages) = Pipeline::spawn(delay)?.into_parts();

    // Printer thread drains the output queue so slow stages never
    // block the reader loop below.
    let printer = std::thread::Builder::new()
        .name("pipe-output".to_string())
        .spawn(move || {
            while let Ok(message) = output.recv() {
                match message {
                    Message::Text(text) => println!("{text}"),
                    Message::Shutdown => break,
                }
            }
        })?;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let message = Message::from_line(&line);
        let is_shutdown = message == Message::Shutdown;
        if input.send(message).is_err() {
            break;
        }
        if is_shutdown {
            break;
        }
    }
    // EOF without the token still tears the pipeline down: dropping
    // the input makes stage A synthesize the shutdown marker.
    drop(input);

    for handle in stages.into_iter().chain(std::iter::once(printer)) {
        if handle.join().is_err() {
            tracing::error!("pipeline thread panicked");
        }
    }
    Ok(())
}

/// Print the registry, one integrand per line.
fn list_integrands() {
    for def in registered_integrands() {
        println!("{:<10} {}", def.name, def.description);
    }
}
