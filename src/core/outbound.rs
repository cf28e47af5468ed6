//! Outbound hue queue
//!
//! Unbounded FIFO between any number of producers on the UI side and the
//! single link thread. Nothing is deduplicated.

use crate::core::codec::HueCommand;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Producer side, cheap to clone
#[derive(Debug, Clone)]
pub struct HueSender {
    tx: Sender<HueCommand>,
}

/// Consumer side, owned by the link
#[derive(Debug)]
pub struct HueReceiver {
    rx: Receiver<HueCommand>,
}

/// Create a connected sender/receiver pair
pub fn hue_queue() -> (HueSender, HueReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (HueSender { tx }, HueReceiver { rx })
}

impl HueSender {
    /// Enqueue a command without blocking
    ///
    /// Returns `false` if the link has already gone away.
    pub fn push(&self, command: HueCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    /// Number of commands waiting
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

impl HueReceiver {
    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Number of commands waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Pop the oldest command if there is one
    pub fn try_pop(&self) -> Option<HueCommand> {
        match self.rx.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::thread;

    #[test]
    fn test_fifo_single_producer() {
        let (tx, rx) = hue_queue();
        assert!(rx.is_empty());
        for v in [3u8, 1, 2, 2] {
            assert!(tx.push(HueCommand::new(v)));
        }
        assert_eq!(rx.len(), 4);

        let drained: Vec<u8> = std::iter::from_fn(|| rx.try_pop()).map(|c| c.value).collect();
        assert_eq!(drained, vec![3, 1, 2, 2]);
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_many_producers_no_loss() {
        const PRODUCERS: u8 = 4;
        const PER_PRODUCER: u8 = 50;

        let (tx, rx) = hue_queue();
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        // Encode producer in the high bits so order can be checked per producer
                        tx.push(HueCommand::new(p * 64 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut last: HashMap<u8, u8> = HashMap::new();
        let mut count = 0usize;
        while let Some(cmd) = rx.try_pop() {
            let (producer, seq) = (cmd.value / 64, cmd.value % 64);
            if let Some(prev) = last.insert(producer, seq) {
                assert_eq!(seq, prev + 1, "producer {producer} out of order");
            } else {
                assert_eq!(seq, 0);
            }
            count += 1;
        }

        assert_eq!(count, usize::from(PRODUCERS) * usize::from(PER_PRODUCER));
        assert!(last.values().all(|&seq| seq == PER_PRODUCER - 1));
    }

    #[test]
    fn test_push_after_receiver_dropped() {
        let (tx, rx) = hue_queue();
        drop(rx);
        assert!(!tx.push(HueCommand::new(1)));
    }
}
