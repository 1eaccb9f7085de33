//! Pipeline Messages
//!
//! The shutdown marker is a dedicated variant rather than a magic
//! payload, so a legitimate message can never collide with it inside
//! the pipeline. The legacy literal only exists at the text boundary.

/// The reserved token recognized on the external text boundary.
/// Never a valid application message.
pub const SENTINEL_TOKEN: &str = "FINISH";

/// One item flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A text payload to be transformed and forwarded.
    Text(String),
    /// Cooperative-shutdown marker. A stage that receives it forwards
    /// exactly one equivalent marker downstream and then exits.
    Shutdown,
}

impl Message {
    /// Interpret one external input line: the sentinel token maps to
    /// [`Message::Shutdown`], anything else is a payload.
    pub fn from_line(line: &str) -> Self {
        if line == SENTINEL_TOKEN {
            Message::Shutdown
        } else {
            Message::Text(line.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_token_maps_to_shutdown() {
        assert_eq!(Message::from_line("FINISH"), Message::Shutdown);
    }

    #[test]
    fn ordinary_lines_are_payloads() {
        assert_eq!(
            Message::from_line("hello"),
            Message::Text("hello".to_string())
        );
        // Near-misses stay payloads; only the exact token is reserved.
        assert_eq!(
            Message::from_line("finish"),
            Message::Text("finish".to_string())
        );
        assert_eq!(
            Message::from_line(" FINISH"),
            Message::Text(" FINISH".to_string())
        );
    }
}
