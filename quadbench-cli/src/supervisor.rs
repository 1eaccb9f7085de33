//! Isolated-Process Execution
//!
//! The process strategy: each quadrature task runs in its own worker
//! process with independent memory. The worker binary is this same
//! executable relaunched with a hidden flag; commands and replies
//! travel as rkyv frames over the child's piped stdin/stdout.
//!
//! Nothing is shared across the boundary: tasks carry the integrand by
//! registry name, logging options as plain data, and each worker
//! builds its own logger and invoker.

use crate::executor::ExecError;
use quadbench_core::{iterations_per_job, split_interval, RemainderPolicy};
use quadbench_ipc::{
    FrameError, FrameReader, FrameWriter, LogOptions, SupervisorCommand, TaskSpec,
    WorkerCapabilities, WorkerMessage, PROTOCOL_VERSION,
};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::env;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;

/// Failures in worker process management and IPC.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The worker process could not be spawned.
    #[error("failed to spawn worker: {0}")]
    SpawnFailed(#[from] std::io::Error),

    /// A task or reply could not cross the isolation boundary.
    /// Fatal for that dispatch; never retried.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Frame-level transport failure.
    #[error("IPC error: {0}")]
    Ipc(String),

    /// The worker exited or closed its pipe unexpectedly.
    #[error("worker crashed: {0}")]
    WorkerCrashed(String),

    /// The worker spoke out of turn.
    #[error("worker protocol error: expected {expected}, got {got}")]
    Protocol {
        /// What the coordinator was waiting for.
        expected: String,
        /// What actually arrived.
        got: String,
    },
}

impl From<FrameError> for SupervisorError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Serialization(msg) => SupervisorError::Serialization(msg),
            FrameError::EndOfStream => {
                SupervisorError::WorkerCrashed("worker closed its pipe".to_string())
            }
            other => SupervisorError::Ipc(other.to_string()),
        }
    }
}

/// Outcome of one task on one worker.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The worker produced a partial sum.
    Done {
        /// Partial sum for the task's sub-interval.
        value: f64,
        /// Worker-side elapsed wall-clock nanoseconds.
        elapsed_nanos: u64,
    },
    /// The worker reported a failure for this task.
    Failed {
        /// Human-readable cause, prefixed with the failure kind.
        message: String,
    },
}

/// Handle to one spawned worker process.
pub struct WorkerHandle {
    child: Child,
    reader: FrameReader<ChildStdout>,
    writer: FrameWriter<ChildStdin>,
    capabilities: WorkerCapabilities,
}

impl WorkerHandle {
    /// Spawn a worker by relaunching the current executable in worker
    /// mode, then complete the Hello handshake.
    pub fn spawn() -> Result<Self, SupervisorError> {
        let binary = env::current_exe()?;

        let mut child = Command::new(binary)
            .arg("--quad-worker")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        // Both pipes were requested above; absence is a spawn bug.
        let stdin = child.stdin.take().ok_or_else(|| {
            SupervisorError::WorkerCrashed("worker stdin was not piped".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            SupervisorError::WorkerCrashed("worker stdout was not piped".to_string())
        })?;

        let mut handle = Self {
            child,
            reader: FrameReader::new(stdout),
            writer: FrameWriter::new(stdin),
            capabilities: WorkerCapabilities::default(),
        };
        handle.wait_for_hello()?;
        Ok(handle)
    }

    fn wait_for_hello(&mut self) -> Result<(), SupervisorError> {
        let message: WorkerMessage = self.reader.read()?;
        match message {
            WorkerMessage::Hello(caps) => {
                if caps.protocol_version != PROTOCOL_VERSION {
                    return Err(SupervisorError::Protocol {
                        expected: format!("protocol version {PROTOCOL_VERSION}"),
                        got: format!("protocol version {}", caps.protocol_version),
                    });
                }
                self.capabilities = caps;
                Ok(())
            }
            other => Err(SupervisorError::Protocol {
                expected: "Hello".to_string(),
                got: format!("{other:?}"),
            }),
        }
    }

    /// Capabilities advertised by the worker during the handshake.
    pub fn capabilities(&self) -> &WorkerCapabilities {
        &self.capabilities
    }

    /// Run one task on this worker and wait for its reply.
    pub fn run_task(&mut self, seq: u32, task: &TaskSpec) -> Result<TaskOutcome, SupervisorError> {
        self.writer.write(&SupervisorCommand::Run {
            seq,
            task: task.clone(),
        })?;

        let reply: WorkerMessage = self.reader.read()?;
        match reply {
            WorkerMessage::TaskDone {
                seq: reply_seq,
                value,
                elapsed_nanos,
            } => {
                if reply_seq != seq {
                    return Err(SupervisorError::Protocol {
                        expected: format!("reply for task {seq}"),
                        got: format!("reply for task {reply_seq}"),
                    });
                }
                Ok(TaskOutcome::Done {
                    value,
                    elapsed_nanos,
                })
            }
            WorkerMessage::Failure { kind, message, .. } => Ok(TaskOutcome::Failed {
                message: format!("{kind:?}: {message}"),
            }),
            WorkerMessage::Hello(_) => Err(SupervisorError::Protocol {
                expected: "TaskDone or Failure".to_string(),
                got: "Hello".to_string(),
            }),
        }
    }

    /// Gracefully shut the worker down and reap it.
    pub fn shutdown(mut self) -> Result<(), SupervisorError> {
        self.writer.write(&SupervisorCommand::Shutdown)?;
        let _ = self.child.wait();
        Ok(())
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.is_alive() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Isolated-process executor: one worker process per task.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    jobs: usize,
    policy: RemainderPolicy,
    log: LogOptions,
}

impl ProcessExecutor {
    /// Create an executor dispatching `jobs` isolated tasks.
    pub fn new(jobs: usize, policy: RemainderPolicy, log: LogOptions) -> Self {
        Self { jobs, policy, log }
    }

    /// Build the per-job task specs in submission order.
    fn build_tasks(
        &self,
        integrand: &str,
        low: f64,
        high: f64,
        iterations: u64,
    ) -> Result<Vec<TaskSpec>, ExecError> {
        let intervals = split_interval(low, high, self.jobs)?;
        let counts = iterations_per_job(iterations, self.jobs, self.policy)?;

        Ok(intervals
            .iter()
            .zip(counts)
            .map(|(interval, count)| TaskSpec {
                integrand: integrand.to_string(),
                low: interval.low(),
                high: interval.high(),
                iterations: count,
                log: self.log,
            })
            .collect())
    }

    /// Integrate a registered integrand across isolated workers:
    /// partition, spawn one worker per task, collect partials in
    /// submission order, sum.
    pub fn integrate(
        &self,
        integrand: &str,
        low: f64,
        high: f64,
        iterations: u64,
    ) -> Result<f64, ExecError> {
        let tasks = self.build_tasks(integrand, low, high, iterations)?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| ExecError::Pool(e.to_string()))?;

        // One dispatcher thread per worker process; the indexed collect
        // brings results back in submission order even when workers
        // finish out of order.
        let outcomes: Vec<Result<TaskOutcome, SupervisorError>> = pool.install(|| {
            tasks
                .par_iter()
                .enumerate()
                .map(|(index, task)| {
                    let mut worker = WorkerHandle::spawn()?;
                    let outcome = worker.run_task(index as u32, task)?;
                    worker.shutdown()?;
                    Ok(outcome)
                })
                .collect()
        });

        // Every dispatched task is accounted for before any failure is
        // surfaced; no partial sum escapes.
        let mut acc = 0.0;
        let mut first_failure: Option<ExecError> = None;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(TaskOutcome::Done { value, .. }) => acc += value,
                Ok(TaskOutcome::Failed { message }) => {
                    first_failure
                        .get_or_insert(ExecError::TaskExecution { index, message });
                }
                Err(e) => {
                    first_failure.get_or_insert(ExecError::Supervisor(e));
                }
            }
        }

        match first_failure {
            Some(error) => Err(error),
            None => Ok(acc),
        }
    }
}
