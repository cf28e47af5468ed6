//! Serial I/O loop
//!
//! A single thread owns the port for its whole open lifetime:
//!
//! ```text
//!            open ok
//! Disconnected ──────► Connected ──┐ read / decode / deliver / write one
//!   ▲    │   ▲                 │   │
//!   │    │   └─ transport err ─┘◄──┘
//!   │    │      (backoff)
//!   └────┘ open err (backoff)
//!        │
//!        └─ stop ─► Stopped ◄─ stop ─ Connected
//! ```
//!
//! Open failures and transport errors are retried forever after a fixed
//! backoff. Only the [`StopSignal`] ends the loop.

use crate::config::LinkConfig;
use crate::core::codec::SensorFrame;
use crate::core::dispatch::{FrameSink, LinkStatus};
use crate::core::outbound::HueReceiver;
use crate::core::stop::StopSignal;
use crate::core::transport::{LinePort, PortOpener, TransportError};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, trace, warn};

/// Link counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Frames decoded and delivered
    pub frames_decoded: u64,
    /// Non-empty lines that were not frames, or had an out-of-range pot
    pub lines_dropped: u64,
    /// Hue bytes written to the device
    pub hue_bytes_sent: u64,
    /// Failed open attempts
    pub open_failures: u64,
    /// Read/write failures on an open port
    pub transport_errors: u64,
    /// Successful opens
    pub connects: u64,
}

enum LinkState {
    Disconnected,
    Connected(Box<dyn LinePort>),
    Stopped,
}

enum Cycle {
    Continue,
    Stop,
}

/// The serial I/O loop and its collaborators
pub struct SerialLink<O> {
    config: LinkConfig,
    opener: O,
    outbound: HueReceiver,
    stop: StopSignal,
    sink: Box<dyn FrameSink>,
    stats: Arc<RwLock<LinkStats>>,
}

impl<O: PortOpener> SerialLink<O> {
    /// Wire up a link; nothing is opened until [`run`](Self::run)
    pub fn new(
        config: LinkConfig,
        opener: O,
        outbound: HueReceiver,
        stop: StopSignal,
        sink: impl FrameSink + 'static,
    ) -> Self {
        Self {
            config,
            opener,
            outbound,
            stop,
            sink: Box::new(sink),
            stats: Arc::new(RwLock::new(LinkStats::default())),
        }
    }

    /// Shared view of the counters
    pub fn stats(&self) -> Arc<RwLock<LinkStats>> {
        self.stats.clone()
    }

    /// Run on the current thread until the stop signal is set
    pub fn run(mut self) {
        info!(
            "Serial link starting on {} @ {} baud",
            self.config.device, self.config.baud_rate
        );

        let mut state = LinkState::Disconnected;
        loop {
            state = match state {
                LinkState::Disconnected => self.connect(),
                LinkState::Connected(port) => self.serve(port),
                LinkState::Stopped => break,
            };
        }

        self.sink.on_status(LinkStatus::Stopped);
        info!("Serial link stopped");
    }

    fn connect(&mut self) -> LinkState {
        if self.stop.is_set() {
            return LinkState::Stopped;
        }

        self.sink.on_status(LinkStatus::Connecting);
        match self.opener.open(&self.config) {
            Ok(port) => {
                info!("Opened {}", port.name());
                self.stats.write().connects += 1;
                self.sink.on_status(LinkStatus::Connected {
                    device: port.name().to_string(),
                });
                LinkState::Connected(port)
            }
            Err(e) => {
                warn!(
                    "Could not open {}: {}; retrying in {:?}",
                    self.config.device,
                    e,
                    self.config.reconnect_backoff_duration()
                );
                self.stats.write().open_failures += 1;
                self.back_off(&e)
            }
        }
    }

    fn serve(&mut self, mut port: Box<dyn LinePort>) -> LinkState {
        loop {
            match self.cycle(port.as_mut()) {
                Ok(Cycle::Continue) => {}
                Ok(Cycle::Stop) => {
                    drop(port);
                    return LinkState::Stopped;
                }
                Err(e) => {
                    drop(port);
                    error!(
                        "Serial error on {}: {}; reconnecting in {:?}",
                        self.config.device,
                        e,
                        self.config.reconnect_backoff_duration()
                    );
                    self.stats.write().transport_errors += 1;
                    return self.back_off(&e);
                }
            }
        }
    }

    fn cycle(&mut self, port: &mut dyn LinePort) -> Result<Cycle, TransportError> {
        let line = port.read_line()?;
        if !line.is_empty() {
            trace!("Line: {:?}", String::from_utf8_lossy(&line));
            self.handle_line(&line);
        }

        if let Some(command) = self.outbound.try_pop() {
            port.write_bytes(&command.encode())?;
            self.stats.write().hue_bytes_sent += 1;
            debug!("Sent hue {}", command.value);
        }

        if self.stop.is_set() {
            return Ok(Cycle::Stop);
        }
        Ok(Cycle::Continue)
    }

    fn handle_line(&mut self, line: &[u8]) {
        match SensorFrame::parse(line) {
            Ok(frame) if self.config.pot_range.contains(frame.pot) => {
                self.stats.write().frames_decoded += 1;
                self.sink.deliver(frame);
            }
            Ok(frame) => {
                debug!("Pot {} outside {:?}, dropping", frame.pot, self.config.pot_range);
                self.stats.write().lines_dropped += 1;
            }
            Err(e) => {
                debug!("Dropping line: {}", e);
                self.stats.write().lines_dropped += 1;
            }
        }
    }

    fn back_off(&mut self, cause: &TransportError) -> LinkState {
        self.sink.on_status(LinkStatus::Disconnected {
            reason: cause.to_string(),
        });
        if self.stop.wait_timeout(self.config.reconnect_backoff_duration()) {
            LinkState::Stopped
        } else {
            LinkState::Disconnected
        }
    }
}

impl<O: PortOpener + 'static> SerialLink<O> {
    /// Run the loop on a dedicated `serial-link` thread
    pub fn spawn(self) -> std::io::Result<LinkHandle> {
        let stop = self.stop.clone();
        let stats = self.stats.clone();
        let thread = thread::Builder::new()
            .name("serial-link".to_string())
            .spawn(move || self.run())?;

        Ok(LinkHandle {
            stop,
            stats,
            thread: Some(thread),
        })
    }
}

/// Owner of a running link thread
///
/// Dropping the handle stops the link and waits for the thread.
pub struct LinkHandle {
    stop: StopSignal,
    stats: Arc<RwLock<LinkStats>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl LinkHandle {
    /// Snapshot of the counters
    pub fn stats(&self) -> LinkStats {
        self.stats.read().clone()
    }

    /// Whether the link thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, thread::JoinHandle::is_finished)
    }

    /// Signal stop and wait for the thread to exit
    pub fn stop(&mut self) {
        self.stop.set();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Serial link thread panicked");
            }
        }
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
