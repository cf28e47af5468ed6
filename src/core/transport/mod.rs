//! Transport layer for the serial link
//!
//! The loop talks to the board through two seams:
//! - [`PortOpener`] opens a connection from a [`LinkConfig`]
//! - [`LinePort`] reads terminated lines and writes raw bytes
//!
//! Real hardware goes through [`SerialOpener`]; [`SimulatedOpener`] stands in
//! for a board when none is attached.

mod serial;
mod simulated;

pub use serial::{list_ports, SerialOpener, StreamPort, MAX_LINE_LEN};
pub use simulated::{SimulatedDevice, SimulatedOpener};

use crate::config::LinkConfig;
use thiserror::Error;

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Open failed for another reason
    #[error("Failed to open {device}: {reason}")]
    OpenFailed {
        /// Device that could not be opened
        device: String,
        /// Driver message
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device went away
    #[error("Disconnected")]
    Disconnected,
}

/// An open line-oriented connection
pub trait LinePort: Send {
    /// Read one line including its terminator
    ///
    /// Returns an empty vector when the read timed out with no complete line.
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Write all of `data`
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Human-readable name of the connection
    fn name(&self) -> &str;
}

/// Opens a [`LinePort`] for the configured device
#[cfg_attr(test, mockall::automock)]
pub trait PortOpener: Send {
    /// Open the device described by `config`
    fn open(&self, config: &LinkConfig) -> Result<Box<dyn LinePort>, TransportError>;
}
