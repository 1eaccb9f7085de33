//! Per-Call Timing Instrumentation
//!
//! [`TimedInvoker`] wraps one unit of work: it captures wall-clock
//! start and end times, the elapsed duration and the worker identity,
//! optionally renders the call's parameters and result, and emits
//! exactly one log record after the wrapped call returns. The wrapping
//! stays outside the hot numeric loop — one record per task, not per
//! rectangle.
//!
//! A panic inside the wrapped call propagates unlogged.
//!
//! For the isolated-process strategy the invoker is constructed and
//! used INSIDE the worker process (see `worker.rs`): timing captured
//! around the coordinator's submission call would measure dispatch
//! overhead, not per-worker elapsed time, and the logger handle cannot
//! cross the process boundary anyway.

use chrono::{DateTime, Utc};
use quadbench_ipc::LogOptions;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// The identity tag attached to every log record: the current thread's
/// name when it has one, otherwise the process id.
pub fn worker_identity() -> String {
    match std::thread::current().name() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("pid-{}", std::process::id()),
    }
}

/// Everything captured around one wrapped call.
#[derive(Debug, Clone)]
pub struct InvokeRecord {
    /// Wall-clock time just before the call.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time just after the call returned.
    pub finished_at: DateTime<Utc>,
    /// Monotonic elapsed duration of the call.
    pub elapsed: Duration,
    /// Thread name or process id of the executing worker.
    pub worker: String,
    /// Rendered input parameters, when enabled.
    pub params: Option<String>,
    /// Rendered return value, when enabled.
    pub result: Option<String>,
}

impl InvokeRecord {
    /// Render the record as one multi-field log line, honoring the
    /// same options that controlled capture.
    fn render(&self, options: &LogOptions) -> String {
        let mut line = String::new();
        if options.start_end {
            let _ = write!(line, "start={} ", self.started_at.format("%H:%M:%S%.6f"));
        }
        if let Some(params) = &self.params {
            let _ = write!(line, "params=[{params}] ");
        }
        if let Some(result) = &self.result {
            let _ = write!(line, "result={result} ");
        }
        if options.start_end {
            let _ = write!(line, "end={} ", self.finished_at.format("%H:%M:%S%.6f"));
        }
        if options.duration {
            let _ = write!(line, "elapsed={:.6}s", self.elapsed.as_secs_f64());
        }
        line.trim_end().to_string()
    }
}

/// Wraps units of work with timing and logging.
///
/// Cheap to construct and `Copy`-free by design: the shared-memory
/// strategy holds one invoker and calls it from every worker thread
/// (the tracing sink serializes concurrent appends internally); the
/// isolated strategy constructs its own inside each worker process.
#[derive(Debug, Clone)]
pub struct TimedInvoker {
    options: LogOptions,
}

impl TimedInvoker {
    /// Create an invoker with the given logging options.
    pub fn new(options: LogOptions) -> Self {
        Self { options }
    }

    /// The options this invoker was configured with.
    pub fn options(&self) -> LogOptions {
        self.options
    }

    /// Run `work`, capture timing around it, emit one log record, and
    /// return the result together with the captured record.
    ///
    /// `params` is rendered up front (before the call) so the hot path
    /// pays no formatting cost while the clock is running beyond one
    /// `Display` of the result.
    pub fn call<R, F>(&self, params: &dyn std::fmt::Display, work: F) -> (R, InvokeRecord)
    where
        R: std::fmt::Display,
        F: FnOnce() -> R,
    {
        let rendered_params = if self.options.params {
            Some(params.to_string())
        } else {
            None
        };

        let started_at = Utc::now();
        let clock = Instant::now();
        let value = work();
        let elapsed = clock.elapsed();
        let finished_at = Utc::now();

        let record = InvokeRecord {
            started_at,
            finished_at,
            elapsed,
            worker: worker_identity(),
            params: rendered_params,
            result: if self.options.result {
                Some(value.to_string())
            } else {
                None
            },
        };

        tracing::info!(
            target: "quadbench::invoke",
            worker = %record.worker,
            "{}",
            record.render(&self.options)
        );

        (value, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> LogOptions {
        LogOptions {
            start_end: false,
            params: false,
            result: false,
            duration: false,
        }
    }

    #[test]
    fn call_returns_value_and_timing() {
        let invoker = TimedInvoker::new(LogOptions::default());
        let (value, record) = invoker.call(&"x=1", || {
            std::thread::sleep(Duration::from_millis(10));
            42
        });

        assert_eq!(value, 42);
        assert!(record.elapsed >= Duration::from_millis(5));
        assert!(record.finished_at >= record.started_at);
        assert!(!record.worker.is_empty());
    }

    #[test]
    fn params_and_result_follow_options() {
        let invoker = TimedInvoker::new(LogOptions::default());
        let (_, record) = invoker.call(&"a=0 b=1", || 7);
        assert_eq!(record.params.as_deref(), Some("a=0 b=1"));
        assert_eq!(record.result.as_deref(), Some("7"));

        let invoker = TimedInvoker::new(quiet());
        let (_, record) = invoker.call(&"a=0 b=1", || 7);
        assert!(record.params.is_none());
        assert!(record.result.is_none());
    }

    #[test]
    fn rendered_line_respects_options() {
        let record = InvokeRecord {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            elapsed: Duration::from_millis(3),
            worker: "t1".to_string(),
            params: Some("a=0".to_string()),
            result: Some("1.5".to_string()),
        };

        let full = record.render(&LogOptions::default());
        assert!(full.contains("params=[a=0]"));
        assert!(full.contains("result=1.5"));
        assert!(full.contains("elapsed="));

        let bare = record.render(&quiet());
        // Captured fields still render; disabled timing fields do not.
        assert!(!bare.contains("start="));
        assert!(!bare.contains("elapsed="));
    }

    #[test]
    fn worker_identity_prefers_thread_name() {
        let handle = std::thread::Builder::new()
            .name("quad-test".to_string())
            .spawn(|| worker_identity())
            .unwrap();
        assert_eq!(handle.join().unwrap(), "quad-test");
    }
}
