//! Pipeline Stages
//!
//! Each stage is a single-threaded loop over blocking FIFO channels:
//! receive, transform, forward. Stages share no mutable state beyond
//! the channels. On receiving [`Message::Shutdown`] a stage forwards
//! exactly one equivalent marker downstream, logs its termination and
//! exits without reading again.
//!
//! A transform panic is caught and the stage still forwards `Shutdown`
//! before exiting — otherwise the marker would be lost and every
//! downstream consumer would block forever.

use crate::message::Message;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

/// Apply the ROT13 substitution cipher to ASCII letters; all other
/// characters pass through. Reversible: applying it twice yields the
/// input.
pub fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a' + 13) % 26) + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A' + 13) % 26) + b'A') as char,
            other => other,
        })
        .collect()
}

/// Run one stage until shutdown.
///
/// The loop ends when a `Shutdown` marker arrives, when the inbound
/// channel disconnects (the producer vanished without a marker — the
/// stage still forwards one), or when the outbound channel
/// disconnects (nobody is listening downstream).
pub fn run_stage<F>(name: &str, inbound: Receiver<Message>, outbound: Sender<Message>, transform: F)
where
    F: Fn(String) -> String,
{
    loop {
        let message = match inbound.recv() {
            Ok(message) => message,
            Err(_) => {
                tracing::warn!(stage = name, "inbound channel closed without shutdown marker");
                let _ = outbound.send(Message::Shutdown);
                break;
            }
        };

        match message {
            Message::Text(text) => {
                let transformed =
                    std::panic::catch_unwind(AssertUnwindSafe(|| transform(text)));
                match transformed {
                    Ok(output) => {
                        tracing::debug!(stage = name, payload = %output, "forwarding");
                        if outbound.send(Message::Text(output)).is_err() {
                            tracing::warn!(stage = name, "outbound channel closed");
                            break;
                        }
                    }
                    Err(_) => {
                        tracing::error!(stage = name, "transform panicked; shutting down");
                        let _ = outbound.send(Message::Shutdown);
                        break;
                    }
                }
            }
            Message::Shutdown => {
                let _ = outbound.send(Message::Shutdown);
                tracing::info!(stage = name, "stage terminated");
                break;
            }
        }
    }
}

/// A running two-stage pipeline.
///
/// Stage A lowercases each payload after a fixed artificial delay
/// (simulating slow work); stage B applies ROT13. The driver feeds
/// [`Pipeline::input`], reads [`Pipeline::output`], and sends
/// [`Message::Shutdown`] once to begin orderly teardown.
pub struct Pipeline {
    /// Producer end of stage A's inbound queue.
    pub input: Sender<Message>,
    /// Consumer end of stage B's outbound queue.
    pub output: Receiver<Message>,
    handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Spawn both stage threads, connected by unbounded FIFO channels.
    pub fn spawn(stage_a_delay: Duration) -> std::io::Result<Self> {
        let (input, a_inbound) = channel();
        let (a_outbound, b_inbound) = channel();
        let (b_outbound, output) = channel();

        let stage_a = std::thread::Builder::new()
            .name("stage-a".to_string())
            .spawn(move || {
                run_stage("stage-a", a_inbound, a_outbound, move |text| {
                    std::thread::sleep(stage_a_delay);
                    text.to_lowercase()
                });
            })?;

        let stage_b = std::thread::Builder::new()
            .name("stage-b".to_string())
            .spawn(move || {
                run_stage("stage-b", b_inbound, b_outbound, |text| rot13(&text));
            })?;

        Ok(Self {
            input,
            output,
            handles: vec![stage_a, stage_b],
        })
    }

    /// Split the pipeline into its channel ends and stage handles,
    /// for drivers that hand the ends to different threads.
    pub fn into_parts(
        self,
    ) -> (
        Sender<Message>,
        Receiver<Message>,
        Vec<JoinHandle<()>>,
    ) {
        (self.input, self.output, self.handles)
    }

    /// Wait for both stages to exit. Call after sending `Shutdown`.
    pub fn join(self) {
        // A stage thread only panics if the runtime itself is broken;
        // surface that to the caller.
        for handle in self.handles {
            if handle.join().is_err() {
                tracing::error!("pipeline stage thread panicked");
            }
        }
    }
}
