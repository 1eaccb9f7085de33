//! Integration tests for the quadbench CLI crate
//!
//! These tests exercise the end-to-end flow through the public API:
//! argument parsing, strategy dispatch, and report generation.

use clap::Parser;
use quadbench_cli::{
    integrate_with_strategy, BenchmarkReport, Cli, ExecError, QuadConfig, Strategy,
};
use quadbench_core::RemainderPolicy;
use quadbench_ipc::LogOptions;
use std::f64::consts::FRAC_PI_2;

fn quiet_log() -> LogOptions {
    LogOptions {
        start_end: false,
        params: false,
        result: false,
        duration: false,
    }
}

/// The default scenario: cosine over [0, pi/2] integrates to 1 under
/// the thread strategy.
#[test]
fn thread_strategy_end_to_end() {
    let result = integrate_with_strategy(
        "cos",
        0.0,
        FRAC_PI_2,
        4,
        1_000_000,
        Strategy::Threads,
        RemainderPolicy::FirstJob,
        quiet_log(),
    )
    .unwrap();

    assert!((result - 1.0).abs() < 1e-5);
}

/// Both remainder policies produce a result close to the analytic
/// value; inflate just spends a few extra iterations.
#[test]
fn remainder_policies_agree_on_the_answer() {
    let exact = integrate_with_strategy(
        "sin",
        0.0,
        2.0,
        3,
        1_000_001,
        Strategy::Threads,
        RemainderPolicy::FirstJob,
        quiet_log(),
    )
    .unwrap();

    let inflated = integrate_with_strategy(
        "sin",
        0.0,
        2.0,
        3,
        1_000_001,
        Strategy::Threads,
        RemainderPolicy::Inflate,
        quiet_log(),
    )
    .unwrap();

    let analytic = 1.0 - 2.0f64.cos();
    assert!((exact - analytic).abs() < 1e-4);
    assert!((inflated - analytic).abs() < 1e-4);
}

/// An unregistered integrand name is rejected before any task is
/// dispatched, under either strategy.
#[test]
fn unknown_integrand_is_rejected_for_both_strategies() {
    for strategy in [Strategy::Threads, Strategy::Processes] {
        let result = integrate_with_strategy(
            "no-such-function",
            0.0,
            1.0,
            2,
            1000,
            strategy,
            RemainderPolicy::FirstJob,
            quiet_log(),
        );
        assert!(matches!(result, Err(ExecError::UnknownIntegrand(_))));
    }
}

/// Bad numeric arguments fail synchronously with InvalidArgument.
#[test]
fn invalid_arguments_are_rejected() {
    let result = integrate_with_strategy(
        "cos",
        1.0,
        0.0, // inverted bounds
        2,
        1000,
        Strategy::Threads,
        RemainderPolicy::FirstJob,
        quiet_log(),
    );
    assert!(matches!(result, Err(ExecError::InvalidArgument(_))));
}

/// CLI flags parse into the expected fields.
#[test]
fn cli_flags_parse() {
    let cli = Cli::try_parse_from([
        "quadbench",
        "--integrand",
        "sin",
        "--lower",
        "0.5",
        "--upper",
        "2.5",
        "-n",
        "5000",
        "-j",
        "3",
        "--strategy",
        "processes",
        "--remainder",
        "inflate",
    ])
    .unwrap();

    assert_eq!(cli.integrand.as_deref(), Some("sin"));
    assert_eq!(cli.lower, Some(0.5));
    assert_eq!(cli.upper, Some(2.5));
    assert_eq!(cli.iterations, Some(5000));
    assert_eq!(cli.jobs, Some(3));
    assert_eq!(cli.strategy, Some(Strategy::Processes));
    assert_eq!(cli.remainder.as_deref(), Some("inflate"));
    assert!(!cli.quad_worker);
}

/// A bad strategy string is a parse error, not a silent default.
#[test]
fn cli_rejects_unknown_strategy() {
    let result = Cli::try_parse_from(["quadbench", "--strategy", "fibers"]);
    assert!(result.is_err());
}

/// The hidden worker flag still parses.
#[test]
fn cli_accepts_worker_flag() {
    let cli = Cli::try_parse_from(["quadbench", "--quad-worker"]).unwrap();
    assert!(cli.quad_worker);
}

/// Config defaults plus a report write round out the bench flow
/// without spawning processes.
#[test]
fn bench_report_flow_writes_expected_lines() {
    let config = QuadConfig::default();
    let log = quiet_log();

    let sequential = integrate_with_strategy(
        &config.runner.integrand,
        config.runner.lower,
        config.runner.upper,
        1,
        100_000,
        Strategy::Threads,
        config.runner.remainder,
        log,
    )
    .unwrap();
    let threaded = integrate_with_strategy(
        &config.runner.integrand,
        config.runner.lower,
        config.runner.upper,
        4,
        100_000,
        Strategy::Threads,
        config.runner.remainder,
        log,
    )
    .unwrap();
    assert!((sequential - threaded).abs() < 1e-6);

    let mut report = BenchmarkReport::new();
    report.push("sequential", 1.5, "s");
    report.push("threads", 0.5, "s");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");
    report.write_to(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "sequential:\t1.5 s\nthreads:\t0.5 s\n");
}
