#![warn(missing_docs)]
//! Quadbench Core
//!
//! The numeric half of quadbench:
//! - interval partitioning for parallel work splitting
//! - left-endpoint Riemann quadrature with a configurable
//!   remainder-distribution policy
//! - a registry of named integrands that can be addressed across the
//!   process-isolation boundary
//! - per-call timing instrumentation ([`TimedInvoker`])
//! - the worker process entry point for the isolated strategy

mod interval;
mod invoke;
mod quad;
mod registry;
mod worker;

pub use interval::{split_interval, ArgumentError, Interval};
pub use invoke::{worker_identity, InvokeRecord, TimedInvoker};
pub use quad::{integrate, iterations_per_job, RemainderPolicy};
pub use registry::{find_integrand, registered_integrands, IntegrandDef};
pub use worker::{panic_message, WorkerMain};
