//! Core module containing the serial link
//!
//! This module provides:
//! - Line protocol codec (sensor frames in, hue bytes out)
//! - Transport layer (serial port and simulated board)
//! - Serial I/O loop with reconnect-on-failure
//! - Outbound hue queue and stop signal
//! - UI-thread hand-off for decoded frames
//! - Slider debounce

pub mod codec;
pub mod debounce;
pub mod dispatch;
pub mod link;
pub mod outbound;
pub mod stop;
pub mod transport;
