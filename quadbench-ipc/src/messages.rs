//! IPC Message Types
//!
//! Everything that crosses the isolation boundary lives here. Tasks
//! reference their integrand by registry name; the worker resolves the
//! name on its own side of the boundary.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// What a timed invocation writes to the log.
///
/// Also appears in `quad.toml` under `[log]`, hence the serde derives
/// next to the rkyv ones: the same options travel to isolated workers
/// inside each [`TaskSpec`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize, Serialize,
    Deserialize,
)]
#[archive(check_bytes)]
pub struct LogOptions {
    /// Record wall-clock start and end timestamps.
    #[serde(default = "enabled")]
    pub start_end: bool,
    /// Record the rendered input parameters.
    #[serde(default = "enabled")]
    pub params: bool,
    /// Record the rendered return value.
    #[serde(default = "enabled")]
    pub result: bool,
    /// Record the elapsed duration.
    #[serde(default = "enabled")]
    pub duration: bool,
}

fn enabled() -> bool {
    true
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            start_end: true,
            params: true,
            result: true,
            duration: true,
        }
    }
}

/// One quadrature task shipped to an isolated worker.
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct TaskSpec {
    /// Registry name of the integrand (resolved worker-side).
    pub integrand: String,
    /// Lower bound of the sub-interval.
    pub low: f64,
    /// Upper bound of the sub-interval.
    pub high: f64,
    /// Left-rule iteration count for this sub-interval.
    pub iterations: u64,
    /// Logging options for the worker-side timed invocation.
    pub log: LogOptions,
}

impl TaskSpec {
    /// Validate the task, returning a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.integrand.is_empty() {
            return Err("integrand name must not be empty".to_string());
        }
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(format!(
                "interval bounds must be finite (got [{}, {}])",
                self.low, self.high
            ));
        }
        if self.low > self.high {
            return Err(format!(
                "interval bounds out of order: {} > {}",
                self.low, self.high
            ));
        }
        if self.iterations == 0 {
            return Err("iteration count must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Worker capabilities advertised during the Hello handshake.
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct WorkerCapabilities {
    /// Protocol version for compatibility checking.
    pub protocol_version: u32,
    /// OS process id of the worker (the worker-identity tag in logs).
    pub pid: u32,
    /// Number of logical CPUs visible to the worker.
    pub cpu_count: u32,
}

impl Default for WorkerCapabilities {
    fn default() -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            pid: std::process::id(),
            cpu_count: std::thread::available_parallelism()
                .map(|p| p.get() as u32)
                .unwrap_or(1),
        }
    }
}

/// Commands sent from the coordinator to a worker.
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum SupervisorCommand {
    /// Run one quadrature task. The worker replies exactly once,
    /// echoing `seq`.
    Run {
        /// Submission index, echoed in the reply for order checking.
        seq: u32,
        /// The task itself.
        task: TaskSpec,
    },
    /// Health check; no reply expected.
    Ping,
    /// Request graceful shutdown. The worker exits its command loop.
    Shutdown,
}

/// Categories of worker-side failure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub enum FailureKind {
    /// The integrand panicked mid-computation.
    Panic,
    /// The task named an integrand absent from this worker's registry.
    UnknownIntegrand,
    /// The task failed validation on the worker side.
    InvalidTask,
    /// Anything else.
    Unknown,
}

/// Messages sent from a worker back to the coordinator.
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum WorkerMessage {
    /// Initial handshake.
    Hello(WorkerCapabilities),

    /// Task completed; `elapsed_nanos` is measured inside the worker,
    /// around the computation only.
    TaskDone {
        /// Echoed submission index.
        seq: u32,
        /// The partial sum for this sub-interval.
        value: f64,
        /// Worker-side elapsed wall-clock time.
        elapsed_nanos: u64,
    },

    /// Task failed; no value is produced for this submission index.
    Failure {
        /// Echoed submission index.
        seq: u32,
        /// Failure category.
        kind: FailureKind,
        /// Human-readable cause.
        message: String,
    },
}
