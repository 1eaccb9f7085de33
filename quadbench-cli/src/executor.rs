//! Shared-Memory Execution
//!
//! The thread strategy: all tasks run in worker threads of one rayon
//! pool, sharing the address space and the tracing sink. Each task
//! touches only its own interval and result slot, so no locking is
//! needed beyond the log sink's internal serialization.
//!
//! Partial results are collected in submission order — rayon's indexed
//! collect guarantees it — so result lists always line up with their
//! originating intervals. Any task failure surfaces only after every
//! task has been accounted for, and no partial sum is ever returned.

use crate::config::Strategy;
use crate::supervisor::{ProcessExecutor, SupervisorError};
use quadbench_core::{
    find_integrand, integrate, iterations_per_job, panic_message, split_interval, ArgumentError,
    RemainderPolicy, TimedInvoker,
};
use quadbench_ipc::LogOptions;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::panic::AssertUnwindSafe;
use thiserror::Error;

/// Failures surfaced by either execution strategy.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Bad interval, job count or iteration budget.
    #[error(transparent)]
    InvalidArgument(#[from] ArgumentError),

    /// The integrand name is not in the registry.
    #[error("unknown integrand: {0}")]
    UnknownIntegrand(String),

    /// A dispatched task failed. Reported once all tasks finished;
    /// partial results are discarded.
    #[error("task {index} failed: {message}")]
    TaskExecution {
        /// Submission index of the failing task.
        index: usize,
        /// Cause extracted from the task.
        message: String,
    },

    /// The worker pool could not be constructed.
    #[error("worker pool: {0}")]
    Pool(String),

    /// The isolated strategy failed below the task level.
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// Shared-memory (thread pool) executor.
#[derive(Debug, Clone)]
pub struct ThreadExecutor {
    jobs: usize,
    policy: RemainderPolicy,
    log: LogOptions,
}

impl ThreadExecutor {
    /// Create an executor dispatching `jobs` concurrent tasks.
    pub fn new(jobs: usize, policy: RemainderPolicy, log: LogOptions) -> Self {
        Self { jobs, policy, log }
    }

    /// Compute per-task partial sums, in submission order.
    ///
    /// Accepts any `Fn(f64) -> f64` — the shared-memory strategy has
    /// no serializability constraint, unlike the isolated one.
    pub fn partials<F>(&self, f: F, low: f64, high: f64, iterations: u64) -> Result<Vec<f64>, ExecError>
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let intervals = split_interval(low, high, self.jobs)?;
        let counts = iterations_per_job(iterations, self.jobs, self.policy)?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("quad-worker-{i}"))
            .build()
            .map_err(|e| ExecError::Pool(e.to_string()))?;

        let invoker = TimedInvoker::new(self.log);
        let f = &f;
        let invoker = &invoker;

        // Indexed parallel collect: results come back in submission
        // order regardless of completion order.
        let outcomes: Vec<Result<f64, String>> = pool.install(|| {
            intervals
                .par_iter()
                .zip(counts.par_iter())
                .map(|(interval, &count)| {
                    let params = format!(
                        "low={} high={} iterations={count}",
                        interval.low(),
                        interval.high()
                    );
                    std::panic::catch_unwind(AssertUnwindSafe(|| {
                        let (value, _record) =
                            invoker.call(&params, || integrate(f, *interval, count));
                        value
                    }))
                    .map_err(panic_message)
                })
                .collect()
        });

        // All tasks are accounted for at this point; fail on the first
        // error, discarding every partial.
        let mut partials = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) => partials.push(value),
                Err(message) => return Err(ExecError::TaskExecution { index, message }),
            }
        }
        Ok(partials)
    }

    /// Integrate `f` over `[low, high]`: partition, dispatch, sum.
    pub fn integrate<F>(&self, f: F, low: f64, high: f64, iterations: u64) -> Result<f64, ExecError>
    where
        F: Fn(f64) -> f64 + Sync,
    {
        Ok(self.partials(f, low, high, iterations)?.iter().sum())
    }
}

/// Integrate a registered integrand under the chosen strategy.
#[allow(clippy::too_many_arguments)]
pub fn integrate_with_strategy(
    integrand: &str,
    low: f64,
    high: f64,
    jobs: usize,
    iterations: u64,
    strategy: Strategy,
    policy: RemainderPolicy,
    log: LogOptions,
) -> Result<f64, ExecError> {
    match strategy {
        Strategy::Threads => {
            let def = find_integrand(integrand)
                .ok_or_else(|| ExecError::UnknownIntegrand(integrand.to_string()))?;
            ThreadExecutor::new(jobs, policy, log).integrate(def.eval, low, high, iterations)
        }
        Strategy::Processes => {
            // The worker resolves the name on its side of the boundary,
            // but rejecting a bad name here beats spawning processes
            // that will all fail.
            if find_integrand(integrand).is_none() {
                return Err(ExecError::UnknownIntegrand(integrand.to_string()));
            }
            ProcessExecutor::new(jobs, policy, log).integrate(integrand, low, high, iterations)
        }
    }
}
