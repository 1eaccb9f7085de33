//! Length-Prefixed Frame Encoding
//!
//! Gives stream-based IPC (piped stdin/stdout) reliable message
//! boundaries: a 4-byte little-endian length followed by the rkyv
//! payload.

use rkyv::ser::serializers::AllocSerializer;
use rkyv::validation::validators::DefaultValidator;
use rkyv::{Archive, CheckBytes, Deserialize, Infallible, Serialize};
use std::io::{BufReader, BufWriter, Read, Write};
use thiserror::Error;

/// Maximum frame size. Task and reply messages are tiny; anything
/// larger than this indicates a corrupt length prefix.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Underlying pipe read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The message could not be serialized for transport.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The received payload failed validation or deserialization.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Length prefix exceeded [`MAX_FRAME_SIZE`].
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Claimed payload size.
        size: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Structurally invalid frame (e.g. zero-length payload).
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The peer closed the stream between frames.
    #[error("end of stream")]
    EndOfStream,
}

/// Write one length-prefixed message.
pub fn write_frame<W, T>(writer: &mut BufWriter<W>, message: &T) -> Result<(), FrameError>
where
    W: Write,
    T: Serialize<AllocSerializer<256>>,
{
    let bytes =
        rkyv::to_bytes::<_, 256>(message).map_err(|e| FrameError::Serialization(e.to_string()))?;

    let len = bytes.len();
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }

    writer.write_all(&(len as u32).to_le_bytes())?;
    writer.write_all(&bytes)?;
    // Flush per message; the peer blocks on this frame.
    writer.flush()?;

    Ok(())
}

/// Read one length-prefixed message.
pub fn read_frame<R, T>(reader: &mut BufReader<R>) -> Result<T, FrameError>
where
    R: Read,
    T: Archive,
    T::Archived: for<'a> CheckBytes<DefaultValidator<'a>> + Deserialize<T, Infallible>,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(FrameError::EndOfStream);
        }
        Err(e) => return Err(FrameError::Io(e)),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    if len == 0 {
        return Err(FrameError::InvalidFrame("zero-length frame".to_string()));
    }

    // rkyv requires an aligned buffer for validation.
    let mut buf = rkyv::AlignedVec::with_capacity(len);
    buf.resize(len, 0);
    reader.read_exact(&mut buf)?;

    let archived = rkyv::check_archived_root::<T>(&buf)
        .map_err(|e| FrameError::Deserialization(e.to_string()))?;

    let value: T = archived
        .deserialize(&mut Infallible)
        .map_err(|_| FrameError::Deserialization("archived value rejected".to_string()))?;

    Ok(value)
}

/// Buffered frame writer for one directed edge of the protocol.
pub struct FrameWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> FrameWriter<W> {
    /// Wrap a writer in a buffered frame encoder.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(8 * 1024, writer),
        }
    }

    /// Serialize and send one message.
    pub fn write<T>(&mut self, message: &T) -> Result<(), FrameError>
    where
        T: Serialize<AllocSerializer<256>>,
    {
        write_frame(&mut self.writer, message)
    }
}

/// Buffered frame reader for one directed edge of the protocol.
pub struct FrameReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a reader in a buffered frame decoder.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(8 * 1024, reader),
        }
    }

    /// Block until one full message has been received and decoded.
    pub fn read<T>(&mut self) -> Result<T, FrameError>
    where
        T: Archive,
        T::Archived: for<'a> CheckBytes<DefaultValidator<'a>> + Deserialize<T, Infallible>,
    {
        read_frame(&mut self.reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
    use std::io::Cursor;

    #[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
    #[archive(check_bytes)]
    struct Probe {
        seq: u32,
        value: f64,
        note: String,
    }

    #[test]
    fn roundtrip_single_frame() {
        let original = Probe {
            seq: 1,
            value: 0.5,
            note: "partial sum".to_string(),
        };

        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.write(&original).unwrap();
        }

        let mut reader = FrameReader::new(Cursor::new(buffer));
        let decoded: Probe = reader.read().unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn frames_preserve_order() {
        let probes: Vec<Probe> = (0..4)
            .map(|i| Probe {
                seq: i,
                value: i as f64 * 0.25,
                note: format!("job {i}"),
            })
            .collect();

        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            for probe in &probes {
                writer.write(probe).unwrap();
            }
        }

        let mut reader = FrameReader::new(Cursor::new(buffer));
        for expected in &probes {
            let decoded: Probe = reader.read().unwrap();
            assert_eq!(expected, &decoded);
        }
    }

    #[test]
    fn empty_stream_is_end_of_stream() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let result: Result<Probe, _> = reader.read();
        assert!(matches!(result, Err(FrameError::EndOfStream)));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(u32::MAX).to_le_bytes());
        buffer.extend_from_slice(&[0u8; 16]);

        let mut reader = FrameReader::new(Cursor::new(buffer));
        let result: Result<Probe, _> = reader.read();
        assert!(matches!(result, Err(FrameError::FrameTooLarge { .. })));
    }

    #[test]
    fn zero_length_frame_is_invalid() {
        let buffer = 0u32.to_le_bytes().to_vec();
        let mut reader = FrameReader::new(Cursor::new(buffer));
        let result: Result<Probe, _> = reader.read();
        assert!(matches!(result, Err(FrameError::InvalidFrame(_))));
    }
}
