//! Interval Partitioning
//!
//! Splits `[low, high]` into `n` equal, contiguous sub-intervals.
//! Interval `i` ends exactly where interval `i + 1` begins (both ends
//! are computed from the same `low + k * width` expression), so the
//! partition covers the whole range with no gaps or overlaps beyond
//! floating-point rounding.

use thiserror::Error;

/// Invalid inputs to the partitioner or the quadrature routines.
/// Reported synchronously to the caller, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgumentError {
    /// Job count was zero.
    #[error("job count must be at least 1")]
    JobCount,

    /// Interval bounds were inverted or not finite.
    #[error("invalid interval bounds: low={low}, high={high}")]
    Bounds {
        /// Offending lower bound.
        low: f64,
        /// Offending upper bound.
        high: f64,
    },

    /// Total iteration count was zero.
    #[error("iteration count must be at least 1")]
    Iterations,
}

/// A closed sub-range of the integration domain.
///
/// Invariant: `low <= high`, both finite. Constructed once by
/// [`split_interval`] (or [`Interval::new`]) and immutable afterward;
/// each dispatched task owns its interval exclusively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    low: f64,
    high: f64,
}

impl Interval {
    /// Build an interval, rejecting inverted or non-finite bounds.
    pub fn new(low: f64, high: f64) -> Result<Self, ArgumentError> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(ArgumentError::Bounds { low, high });
        }
        Ok(Self { low, high })
    }

    /// Lower bound.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Split `[low, high]` into `jobs` equal sub-intervals.
///
/// Returns exactly `jobs` intervals in ascending order whose widths
/// sum to `high - low` within floating-point tolerance.
pub fn split_interval(low: f64, high: f64, jobs: usize) -> Result<Vec<Interval>, ArgumentError> {
    if jobs == 0 {
        return Err(ArgumentError::JobCount);
    }
    // Validates the outer bounds once; sub-bounds inherit finiteness.
    Interval::new(low, high)?;

    let width = (high - low) / jobs as f64;
    Ok((0..jobs)
        .map(|i| Interval {
            low: low + i as f64 * width,
            high: low + (i + 1) as f64 * width,
        })
        .collect())
}
