#![warn(missing_docs)]
//! Quadbench Pipeline
//!
//! A two-stage pipeline of long-running workers connected by blocking
//! FIFO queues. Stage A lowercases text after a fixed artificial
//! delay; stage B applies a reversible substitution cipher (ROT13).
//! Shutdown is cooperative: a typed [`Message::Shutdown`] marker
//! travels the whole pipe exactly once, after all preceding payloads,
//! and every stage that receives it forwards it and stops.

mod message;
mod stage;

pub use message::{Message, SENTINEL_TOKEN};
pub use stage::{rot13, run_stage, Pipeline};
