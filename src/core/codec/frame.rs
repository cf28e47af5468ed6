//! Sensor frame line decoding
//!
//! The board prints one reading per line: `:<pot>,<temp>,<humidity>$\r\n`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Start-of-frame marker
pub const FRAME_START: char = ':';
/// End-of-frame marker, sent right before the line terminator
pub const FRAME_END: char = '$';

const FIELD_COUNT: usize = 3;

/// One decoded sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Potentiometer position (0-1023 on a 10-bit ADC)
    pub pot: i32,
    /// Temperature as reported by the board
    pub temperature: i32,
    /// Relative humidity as reported by the board
    pub humidity: i32,
}

/// Reason a line was not accepted as a frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Nothing was read this cycle
    #[error("Empty line")]
    Empty,

    /// Line bytes are not valid UTF-8
    #[error("Line is not valid UTF-8")]
    NotUtf8,

    /// Line does not start with `:` or does not end with a newline
    #[error("Not a frame: {0:?}")]
    NotCandidate(String),

    /// Wrong number of comma separated fields
    #[error("Expected 3 fields, found {0}")]
    FieldCount(usize),

    /// A field is not a base-10 integer
    #[error("Invalid field {index}: {value:?}")]
    BadField {
        /// Zero-based field position
        index: usize,
        /// Raw field text
        value: String,
    },
}

impl SensorFrame {
    /// Create a frame from its three values
    pub fn new(pot: i32, temperature: i32, humidity: i32) -> Self {
        Self {
            pot,
            temperature,
            humidity,
        }
    }

    /// Parse a raw line, reporting why it was rejected
    pub fn parse(line: &[u8]) -> Result<Self, FrameError> {
        if line.is_empty() {
            return Err(FrameError::Empty);
        }

        let text = std::str::from_utf8(line).map_err(|_| FrameError::NotUtf8)?;
        if !text.starts_with(FRAME_START) || !text.ends_with('\n') {
            return Err(FrameError::NotCandidate(text.to_string()));
        }

        let body = text.trim_matches(|c: char| matches!(c, FRAME_START | FRAME_END | '\r' | '\n'));
        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(FrameError::FieldCount(fields.len()));
        }

        let mut values = [0i32; FIELD_COUNT];
        for (index, field) in fields.iter().enumerate() {
            values[index] = field.trim().parse().map_err(|_| FrameError::BadField {
                index,
                value: (*field).to_string(),
            })?;
        }

        Ok(Self::new(values[0], values[1], values[2]))
    }

    /// Render the frame the way the board sends it
    pub fn to_line(&self) -> String {
        format!(
            "{}{},{},{}{}\r\n",
            FRAME_START, self.pot, self.temperature, self.humidity, FRAME_END
        )
    }
}

impl fmt::Display for SensorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pot={} temp={} humidity={}",
            self.pot, self.temperature, self.humidity
        )
    }
}

/// Decode a line into a frame, `None` for anything that is not one
pub fn decode_frame(line: &[u8]) -> Option<SensorFrame> {
    SensorFrame::parse(line).ok()
}

/// Encode a frame as a wire line (`:pot,temp,humidity$\r\n`)
pub fn encode_frame_line(frame: &SensorFrame) -> Vec<u8> {
    frame.to_line().into_bytes()
}
