use hwlink_core::{
    hue_queue, HueCommand, LinePort, LinkConfig, LinkStatus, PortOpener, SensorDisplay,
    SensorFrame, SerialLink, SimulatedOpener, StopSignal, TransportError, UiQueue,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Panel {
    frames: Vec<SensorFrame>,
    statuses: Vec<LinkStatus>,
}

impl SensorDisplay for Panel {
    fn show_frame(&mut self, frame: SensorFrame) {
        self.frames.push(frame);
    }

    fn show_status(&mut self, status: LinkStatus) {
        self.statuses.push(status);
    }
}

fn fast_config() -> LinkConfig {
    LinkConfig::new("/dev/null-board", 115_200)
        .read_timeout(Duration::from_millis(5))
        .reconnect_backoff(Duration::from_millis(20))
}

fn pump_until(queue: &UiQueue<Panel>, panel: &mut Panel, mut done: impl FnMut(&Panel) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(panel) {
        assert!(Instant::now() < deadline, "UI never saw the expected state");
        queue.drain(panel);
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn simulated_board_round_trip() {
    let opener = SimulatedOpener::new(Duration::from_millis(5));
    let written = opener.written();

    let queue: UiQueue<Panel> = UiQueue::new();
    let (hue_tx, hue_rx) = hue_queue();
    let stop = StopSignal::new();
    let mut handle = SerialLink::new(fast_config(), opener, hue_rx, stop.clone(), queue.handle())
        .spawn()
        .unwrap();

    let mut panel = Panel::default();
    pump_until(&queue, &mut panel, |p| p.frames.len() >= 3);

    for value in [10u8, 20, 30] {
        assert!(hue_tx.push(HueCommand::new(value)));
    }
    let deadline = Instant::now() + Duration::from_secs(5);
    while written.lock().len() < 3 {
        assert!(Instant::now() < deadline, "hue bytes never written");
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(*written.lock(), vec![10, 20, 30]);

    handle.stop();
    queue.drain(&mut panel);
    assert!(panel.frames.iter().all(|f| (0..=1023).contains(&f.pot)));
    assert_eq!(panel.statuses.first(), Some(&LinkStatus::Connecting));
    assert_eq!(panel.statuses.last(), Some(&LinkStatus::Stopped));
    assert_eq!(handle.stats().hue_bytes_sent, 3);
}

/// Fails the first `failures` opens, then hands out simulated boards
struct FlakyOpener {
    failures: usize,
    attempts: Arc<AtomicUsize>,
    inner: SimulatedOpener,
}

impl PortOpener for FlakyOpener {
    fn open(&self, config: &LinkConfig) -> Result<Box<dyn LinePort>, TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(TransportError::PortNotFound(config.device.clone()));
        }
        self.inner.open(config)
    }
}

#[test]
fn recovers_after_open_failures() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let opener = FlakyOpener {
        failures: 2,
        attempts: attempts.clone(),
        inner: SimulatedOpener::new(Duration::from_millis(5)),
    };

    let queue: UiQueue<Panel> = UiQueue::new();
    let (_hue_tx, hue_rx) = hue_queue();
    let started = Instant::now();
    let mut handle = SerialLink::new(fast_config(), opener, hue_rx, StopSignal::new(), queue.handle())
        .spawn()
        .unwrap();

    let mut panel = Panel::default();
    pump_until(&queue, &mut panel, |p| !p.frames.is_empty());

    // Two failed opens, each followed by a full backoff
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    handle.stop();
    let stats = handle.stats();
    assert_eq!(stats.open_failures, 2);
    assert_eq!(stats.connects, 1);

    let disconnects = panel
        .statuses
        .iter()
        .filter(|s| matches!(s, LinkStatus::Disconnected { .. }))
        .count();
    assert_eq!(disconnects, 2);
}

#[test]
fn dropping_handle_stops_link() {
    let opener = SimulatedOpener::new(Duration::from_millis(5));
    let seen = Arc::new(Mutex::new(0usize));
    let counter = seen.clone();
    let (_hue_tx, hue_rx) = hue_queue();

    let handle = SerialLink::new(
        fast_config(),
        opener,
        hue_rx,
        StopSignal::new(),
        move |_frame: SensorFrame| *counter.lock() += 1,
    )
    .spawn()
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while *seen.lock() == 0 {
        assert!(Instant::now() < deadline);
        thread::sleep(Duration::from_millis(2));
    }

    drop(handle);
    let after_stop = *seen.lock();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(*seen.lock(), after_stop);
}
