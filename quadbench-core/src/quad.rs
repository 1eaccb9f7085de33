//! Left-Rule Quadrature
//!
//! Approximates a definite integral with the left-endpoint rectangle
//! rule. Accumulation is sequential left-to-right within one task;
//! because floating-point addition is not associative, different
//! partition counts produce sums that differ in the last few ulps.
//! That drift is an accepted approximation-error source, bounded by
//! the quadrature error itself, not a bug.

use crate::interval::{ArgumentError, Interval};
use serde::{Deserialize, Serialize};

/// Approximate the integral of `f` over `interval` with `iterations`
/// left-endpoint rectangles.
///
/// Deterministic for identical floating-point inputs: the same
/// interval and iteration count always produce the bit-identical sum.
pub fn integrate<F>(f: F, interval: Interval, iterations: u64) -> f64
where
    F: Fn(f64) -> f64,
{
    let step = interval.width() / iterations as f64;
    let mut acc = 0.0;
    for i in 0..iterations {
        acc += f(interval.low() + i as f64 * step) * step;
    }
    acc
}

/// How a total iteration budget is distributed across jobs when it
/// does not divide evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RemainderPolicy {
    /// Every job receives `total / jobs + total % jobs` iterations.
    /// Over-allocates the budget by `(jobs - 1) * (total % jobs)`
    /// whenever the total is not evenly divisible; kept for
    /// measurement parity with runs recorded under that scheme. The
    /// extra iterations tighten each partial sum slightly, so results
    /// are not comparable across job counts under this policy.
    Inflate,

    /// The first job absorbs the remainder; every other job receives
    /// `total / jobs`. The budget is exact, and results for different
    /// job counts agree within quadrature tolerance.
    #[default]
    FirstJob,
}

/// Distribute `total` iterations across `jobs` according to `policy`.
///
/// Returns one count per job, in job order.
pub fn iterations_per_job(
    total: u64,
    jobs: usize,
    policy: RemainderPolicy,
) -> Result<Vec<u64>, ArgumentError> {
    if jobs == 0 {
        return Err(ArgumentError::JobCount);
    }
    if total == 0 {
        return Err(ArgumentError::Iterations);
    }

    let jobs_u64 = jobs as u64;
    let base = total / jobs_u64;
    let remainder = total % jobs_u64;

    let counts = match policy {
        RemainderPolicy::Inflate => vec![base + remainder; jobs],
        RemainderPolicy::FirstJob => {
            let mut counts = vec![base; jobs];
            counts[0] += remainder;
            counts
        }
    };

    // More jobs than iterations leaves trailing jobs with zero work;
    // give each at least one rectangle so every task is well-formed.
    Ok(counts.into_iter().map(|c| c.max(1)).collect())
}
