//! # Hwlink Core Library
//!
//! Binds a sensor board on a serial port to a dashboard:
//! - Reads `:<pot>,<temp>,<humidity>$` lines from the board
//! - Writes one hue byte per slider update back to it
//! - Reconnects forever after a fixed backoff when the board goes away
//!
//! ## Example
//!
//! ```rust,no_run
//! use hwlink_core::{hue_queue, HueCommand, LinkConfig, SensorFrame, SerialLink, SerialOpener, StopSignal};
//!
//! fn main() -> std::io::Result<()> {
//!     let (hue_tx, hue_rx) = hue_queue();
//!     let stop = StopSignal::new();
//!     let link = SerialLink::new(
//!         LinkConfig::new("/dev/ttyACM0", 115200),
//!         SerialOpener,
//!         hue_rx,
//!         stop.clone(),
//!         |frame: SensorFrame| println!("{frame}"),
//!     );
//!     let mut handle = link.spawn()?;
//!
//!     hue_tx.push(HueCommand::new(200));
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     handle.stop();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;
pub mod utils;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes};
pub use crate::config::{AppConfig, ConfigError, LinkConfig, LoggingConfig, UiConfig, ValueRange};
pub use crate::core::codec::{
    decode_frame, encode_frame_line, encode_hue, FrameError, HueCommand, SensorFrame,
};
pub use crate::core::debounce::HueDebouncer;
pub use crate::core::dispatch::{FrameSink, LinkStatus, SensorDisplay, UiHandle, UiQueue};
pub use crate::core::link::{LinkHandle, LinkStats, SerialLink};
pub use crate::core::outbound::{hue_queue, HueReceiver, HueSender};
pub use crate::core::stop::StopSignal;
pub use crate::core::transport::{
    list_ports, LinePort, PortOpener, SerialOpener, SimulatedDevice, SimulatedOpener, StreamPort,
    TransportError,
};
pub use crate::utils::init_logging;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
