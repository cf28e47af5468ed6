//! Hand-off from the link thread to the UI thread
//!
//! The link never touches UI state. It reports through a [`FrameSink`]; the
//! UI-side sink, [`UiHandle`], posts a closure into a [`UiQueue`] that only
//! the UI thread drains. [`UiQueue`] is `!Send`, so the state mutation can only
//! run on the thread that created the queue.

use crate::core::codec::SensorFrame;
use crossbeam_channel::{Receiver, Sender};
use std::fmt;
use std::marker::PhantomData;

/// Link connection status reported to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Trying to open the device
    Connecting,
    /// Device open
    Connected {
        /// Port name
        device: String,
    },
    /// Open failed or the connection dropped; a retry is scheduled
    Disconnected {
        /// What went wrong
        reason: String,
    },
    /// Link thread exited
    Stopped,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected { device } => write!(f, "connected to {device}"),
            Self::Disconnected { reason } => write!(f, "disconnected ({reason})"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Receives decoded frames on the link thread
pub trait FrameSink: Send {
    /// A frame was decoded
    fn deliver(&self, frame: SensorFrame);

    /// Connection status changed
    fn on_status(&self, _status: LinkStatus) {}
}

impl<F> FrameSink for F
where
    F: Fn(SensorFrame) + Send,
{
    fn deliver(&self, frame: SensorFrame) {
        self(frame);
    }
}

/// UI state that displays link output
pub trait SensorDisplay {
    /// Show a new reading
    fn show_frame(&mut self, frame: SensorFrame);

    /// Show a status change
    fn show_status(&mut self, _status: LinkStatus) {}
}

type UiTask<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Task queue drained by the UI thread's event loop
pub struct UiQueue<S> {
    tx: Sender<UiTask<S>>,
    rx: Receiver<UiTask<S>>,
    // Pins the queue to the thread that created it
    _not_send: PhantomData<*const ()>,
}

impl<S> Default for UiQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> UiQueue<S> {
    /// Create a queue owned by the current thread
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            _not_send: PhantomData,
        }
    }

    /// Handle that any thread can post through
    pub fn handle(&self) -> UiHandle<S> {
        UiHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run every pending task against `state`, returning how many ran
    pub fn drain(&self, state: &mut S) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task(state);
            ran += 1;
        }
        ran
    }

    /// Tasks waiting to run
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Posts work onto the UI thread
pub struct UiHandle<S> {
    tx: Sender<UiTask<S>>,
}

impl<S> Clone for UiHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> UiHandle<S> {
    /// Queue `task` to run on the UI thread
    ///
    /// Returns `false` if the UI queue is gone.
    pub fn post<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }
}

impl<S: SensorDisplay + 'static> FrameSink for UiHandle<S> {
    fn deliver(&self, frame: SensorFrame) {
        if !self.post(move |state| state.show_frame(frame)) {
            tracing::debug!("UI queue closed, dropping frame");
        }
    }

    fn on_status(&self, status: LinkStatus) {
        self.post(move |state| state.show_status(status));
    }
}
