//! Serial line protocol codec
//!
//! Device to host: one ASCII line per reading, `:<pot>,<temp>,<humidity>$\r\n`.
//! Host to device: one raw byte per hue update.
//!
//! Everything here is pure: no I/O and no state between calls.

mod frame;
mod hue;

pub use frame::{decode_frame, encode_frame_line, FrameError, SensorFrame, FRAME_END, FRAME_START};
pub use hue::{encode_hue, HueCommand};
