//! Virtual sensor board
//!
//! Emits frames on a fixed period and records every byte written to it.
//! Useful for running the dashboard without hardware.

use super::{LinePort, PortOpener, TransportError};
use crate::config::LinkConfig;
use crate::core::codec::{encode_frame_line, SensorFrame};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const POT_MAX: i32 = 1023;
const POT_STEP: i32 = 16;

/// Simulated board
pub struct SimulatedDevice {
    name: String,
    period: Duration,
    read_timeout: Duration,
    next_emit: Instant,
    tick: u64,
    garbage_every: Option<u64>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl SimulatedDevice {
    /// Create a device that emits one frame every `period`
    pub fn new(period: Duration, read_timeout: Duration) -> Self {
        Self {
            name: "simulated".to_string(),
            period,
            read_timeout,
            next_emit: Instant::now(),
            tick: 0,
            garbage_every: None,
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace every n-th line with a truncated one
    #[must_use]
    pub fn garbage_every(mut self, n: u64) -> Self {
        self.garbage_every = (n > 0).then_some(n);
        self
    }

    /// Shared log of bytes written by the host
    pub fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        self.written.clone()
    }

    /// Frame the device reports at a given tick
    pub fn frame_at(tick: u64) -> SensorFrame {
        // Triangle sweep for the pot, slow wobble for the climate values
        let span = u64::try_from(2 * POT_MAX / POT_STEP).unwrap_or(1);
        let phase = i32::try_from(tick % span).unwrap_or(0) * POT_STEP;
        let pot = if phase <= POT_MAX { phase } else { 2 * POT_MAX - phase };
        let wobble = i32::try_from(tick % 20).unwrap_or(0);
        SensorFrame::new(pot.clamp(0, POT_MAX), 215 + wobble / 2, 40 + wobble % 7)
    }

    fn next_line(&mut self) -> Vec<u8> {
        let tick = self.tick;
        self.tick += 1;
        let line = encode_frame_line(&Self::frame_at(tick));
        match self.garbage_every {
            Some(n) if tick % n == n - 1 => line[..line.len() / 2].to_vec(),
            _ => line,
        }
    }
}

impl LinePort for SimulatedDevice {
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let wait = self.next_emit.saturating_duration_since(Instant::now());
        if wait > self.read_timeout {
            thread::sleep(self.read_timeout);
            return Ok(Vec::new());
        }
        thread::sleep(wait);
        self.next_emit += self.period;
        Ok(self.next_line())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.written.lock().extend_from_slice(data);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Opens [`SimulatedDevice`]s that all share one write log
#[derive(Debug, Clone)]
pub struct SimulatedOpener {
    period: Duration,
    garbage_every: Option<u64>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl SimulatedOpener {
    /// Create an opener whose devices emit one frame every `period`
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            garbage_every: None,
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make opened devices corrupt every n-th line
    #[must_use]
    pub fn garbage_every(mut self, n: u64) -> Self {
        self.garbage_every = (n > 0).then_some(n);
        self
    }

    /// Bytes written to any device opened by this opener
    pub fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        self.written.clone()
    }
}

impl PortOpener for SimulatedOpener {
    fn open(&self, config: &LinkConfig) -> Result<Box<dyn LinePort>, TransportError> {
        let mut device = SimulatedDevice::new(self.period, config.read_timeout_duration());
        device.garbage_every = self.garbage_every;
        device.written = self.written.clone();
        device.name = format!("simulated:{}", config.device);
        Ok(Box::new(device))
    }
}
