//! Hue command encoding

use crate::config::ValueRange;
use serde::{Deserialize, Serialize};

/// Hue value chosen on the slider, sent to the board as a single byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HueCommand {
    /// Hue 0-255
    pub value: u8,
}

impl HueCommand {
    /// Create a command from a byte value
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Build a command from a raw slider position, clamped into `range`
    ///
    /// The range itself is clamped to 0-255 so the result always fits a byte.
    pub fn from_slider(position: f64, range: &ValueRange) -> Self {
        let lo = range.min.clamp(0, 255);
        let hi = range.max.clamp(lo, 255);
        let rounded = if position.is_nan() { f64::from(lo) } else { position.round() };
        let clamped = rounded.clamp(f64::from(lo), f64::from(hi));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = clamped as u8;
        Self::new(value)
    }

    /// Wire encoding of this command
    pub fn encode(&self) -> [u8; 1] {
        encode_hue(self.value)
    }
}

impl From<u8> for HueCommand {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Encode a hue as the single byte sent to the board
pub fn encode_hue(value: u8) -> [u8; 1] {
    [value]
}
