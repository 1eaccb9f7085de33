#![warn(missing_docs)]
//! Quadbench IPC Protocol
//!
//! Wire protocol between the coordinating process and isolated
//! quadrature workers. Messages are serialized with rkyv and carried
//! as length-prefixed frames over the worker's piped stdin/stdout.
//!
//! The protocol deliberately ships integrands by registry NAME rather
//! than as callables: an isolated worker shares no memory with the
//! coordinator, so everything that crosses the boundary must be plain
//! serializable data.

mod framing;
mod messages;

pub use framing::{read_frame, write_frame, FrameError, FrameReader, FrameWriter, MAX_FRAME_SIZE};
pub use messages::{
    FailureKind, LogOptions, SupervisorCommand, TaskSpec, WorkerCapabilities, WorkerMessage,
};

/// Protocol version, checked during the Hello handshake.
pub const PROTOCOL_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn command_roundtrip_through_frames() {
        let command = SupervisorCommand::Run {
            seq: 7,
            task: TaskSpec {
                integrand: "cos".to_string(),
                low: 0.0,
                high: 1.5,
                iterations: 1000,
                log: LogOptions::default(),
            },
        };

        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.write(&command).unwrap();
        }

        let mut reader = FrameReader::new(Cursor::new(buffer));
        let decoded: SupervisorCommand = reader.read().unwrap();
        match decoded {
            SupervisorCommand::Run { seq, task } => {
                assert_eq!(seq, 7);
                assert_eq!(task.integrand, "cos");
                assert_eq!(task.iterations, 1000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reply_roundtrip_through_frames() {
        let reply = WorkerMessage::TaskDone {
            seq: 3,
            value: 0.997,
            elapsed_nanos: 12_345,
        };

        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.write(&reply).unwrap();
        }

        let mut reader = FrameReader::new(Cursor::new(buffer));
        let decoded: WorkerMessage = reader.read().unwrap();
        match decoded {
            WorkerMessage::TaskDone {
                seq,
                value,
                elapsed_nanos,
            } => {
                assert_eq!(seq, 3);
                assert_eq!(value, 0.997);
                assert_eq!(elapsed_nanos, 12_345);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
