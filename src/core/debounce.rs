//! Slider debounce
//!
//! Dragging the hue slider produces a burst of changes. Each change re-arms a
//! single-shot deadline; the latest value is released only once the deadline
//! passes with no further change.

use crate::core::codec::HueCommand;
use std::time::{Duration, Instant};

/// Trailing-edge debouncer for hue changes
#[derive(Debug, Clone)]
pub struct HueDebouncer {
    delay: Duration,
    pending: Option<(HueCommand, Instant)>,
}

impl HueDebouncer {
    /// Create a debouncer with the given quiet period
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a slider change at `now`, re-arming the deadline
    pub fn update(&mut self, command: HueCommand, now: Instant) {
        self.pending = Some((command, now + self.delay));
    }

    /// Release the pending command if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<HueCommand> {
        match self.pending {
            Some((command, deadline)) if now >= deadline => {
                self.pending = None;
                Some(command)
            }
            _ => None,
        }
    }

    /// Whether a command is waiting for its deadline
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending command is released
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .map(|(_, deadline)| deadline.saturating_duration_since(now))
    }
}
