//! Worker Process Entry Point
//!
//! The isolated execution strategy spawns this loop in a child
//! process. Commands arrive as frames on stdin; replies leave on
//! stdout. The worker resolves each task's integrand by name in its
//! own registry — nothing executable ever crosses the boundary — and
//! times the computation with its own [`TimedInvoker`], so elapsed
//! figures reflect worker-side wall-clock time.

use crate::invoke::TimedInvoker;
use crate::quad::integrate;
use crate::registry::find_integrand;
use crate::Interval;
use quadbench_ipc::{
    FailureKind, FrameError, FrameReader, FrameWriter, SupervisorCommand, TaskSpec,
    WorkerCapabilities, WorkerMessage,
};

/// Extract a printable message from a caught panic payload.
pub fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Worker main loop over piped stdin/stdout.
pub struct WorkerMain {
    reader: FrameReader<std::io::Stdin>,
    writer: FrameWriter<std::io::Stdout>,
}

impl WorkerMain {
    /// Create a worker bound to this process's stdin/stdout.
    pub fn new() -> Self {
        Self {
            reader: FrameReader::new(std::io::stdin()),
            writer: FrameWriter::new(std::io::stdout()),
        }
    }

    /// Run the command loop until `Shutdown` or the coordinator closes
    /// the pipe.
    pub fn run(&mut self) -> Result<(), FrameError> {
        self.writer
            .write(&WorkerMessage::Hello(WorkerCapabilities::default()))?;

        loop {
            let command: SupervisorCommand = match self.reader.read() {
                Ok(command) => command,
                // Coordinator went away; nothing left to reply to.
                Err(FrameError::EndOfStream) => break,
                Err(e) => return Err(e),
            };

            match command {
                SupervisorCommand::Run { seq, task } => self.run_task(seq, &task)?,
                SupervisorCommand::Ping => {}
                SupervisorCommand::Shutdown => {
                    tracing::debug!(pid = std::process::id(), "worker shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Execute one task and send exactly one reply for it.
    fn run_task(&mut self, seq: u32, task: &TaskSpec) -> Result<(), FrameError> {
        if let Err(message) = task.validate() {
            return self.writer.write(&WorkerMessage::Failure {
                seq,
                kind: FailureKind::InvalidTask,
                message,
            });
        }

        let Some(def) = find_integrand(&task.integrand) else {
            return self.writer.write(&WorkerMessage::Failure {
                seq,
                kind: FailureKind::UnknownIntegrand,
                message: format!("integrand not registered: {}", task.integrand),
            });
        };

        // Bounds were validated above; Interval::new cannot fail here,
        // but a validation drift should surface as a task failure, not
        // a worker crash.
        let interval = match Interval::new(task.low, task.high) {
            Ok(interval) => interval,
            Err(e) => {
                return self.writer.write(&WorkerMessage::Failure {
                    seq,
                    kind: FailureKind::InvalidTask,
                    message: e.to_string(),
                });
            }
        };

        let invoker = TimedInvoker::new(task.log);
        let params = format!(
            "integrand={} low={} high={} iterations={}",
            task.integrand, task.low, task.high, task.iterations
        );

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            invoker.call(&params, || integrate(def.eval, interval, task.iterations))
        }));

        match outcome {
            Ok((value, record)) => self.writer.write(&WorkerMessage::TaskDone {
                seq,
                value,
                elapsed_nanos: record.elapsed.as_nanos() as u64,
            }),
            Err(panic) => self.writer.write(&WorkerMessage::Failure {
                seq,
                kind: FailureKind::Panic,
                message: panic_message(panic),
            }),
        }
    }
}

impl Default for WorkerMain {
    fn default() -> Self {
        Self::new()
    }
}
