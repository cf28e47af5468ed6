//! Hwlink - sensor dashboard
//!
//! Headless stand-in for the slider/display UI:
//! - The main thread is the UI thread; it drains the UI task queue every tick
//! - Readings from the board are printed when they change
//! - Hue values typed on stdin act as slider moves and are debounced

use anyhow::Context;
use clap::Parser;
use hwlink_core::{
    hue_queue, init_logging, AppConfig, HueCommand, HueDebouncer, HueReceiver, HueSender,
    LinkConfig, LinkHandle, LinkStatus, SensorDisplay, SensorFrame, SerialLink, SerialOpener,
    SimulatedOpener, StopSignal, UiHandle, UiQueue, ValueRange,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// UI event loop period
const UI_TICK: Duration = Duration::from_millis(20);

/// Frame period of the simulated board
const SIMULATED_PERIOD: Duration = Duration::from_millis(200);

/// Hwlink dashboard
#[derive(Parser, Debug)]
#[command(name = "hwlink", version, about = "Sensor dashboard for a serial-attached board")]
struct Args {
    /// Serial device (overrides the config file)
    device: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "HWLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Use a simulated board instead of a serial port
    #[arg(long)]
    simulate: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Everything the UI thread owns
struct Dashboard {
    reading: Option<SensorFrame>,
    status: Option<LinkStatus>,
    hue_range: ValueRange,
    debouncer: HueDebouncer,
    outbound: HueSender,
}

impl Dashboard {
    fn new(config: &AppConfig, outbound: HueSender) -> Self {
        Self {
            reading: None,
            status: None,
            hue_range: config.link.hue_range,
            debouncer: HueDebouncer::new(config.ui.hue_debounce()),
            outbound,
        }
    }

    /// Slider moved
    fn set_hue(&mut self, position: f64) {
        let command = HueCommand::from_slider(position, &self.hue_range);
        tracing::debug!("Hue slider at {} -> {}", position, command.value);
        self.debouncer.update(command, Instant::now());
    }

    /// Called once per UI tick
    fn tick(&mut self, now: Instant) {
        if let Some(command) = self.debouncer.poll(now) {
            info!("Sending hue {}", command.value);
            if !self.outbound.push(command) {
                warn!("Serial link is gone, hue {} not sent", command.value);
            }
        }
    }
}

impl SensorDisplay for Dashboard {
    fn show_frame(&mut self, frame: SensorFrame) {
        if self.reading == Some(frame) {
            return;
        }
        self.reading = Some(frame);
        println!(
            "pot {:>4}   temp {:>4}   humidity {:>3}",
            frame.pot, frame.temperature, frame.humidity
        );
    }

    fn show_status(&mut self, status: LinkStatus) {
        if self.status.as_ref() != Some(&status) {
            eprintln!("[{status}]");
            self.status = Some(status);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::load().context("loading config")?,
    };
    if let Some(device) = &args.device {
        config.link.device.clone_from(device);
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }
    config.link.validate()?;

    let _log_guard = init_logging(&config.logging);
    info!("Starting Hwlink v{}", env!("CARGO_PKG_VERSION"));

    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.set()).context("installing Ctrl+C handler")?;
    }

    let ui: UiQueue<Dashboard> = UiQueue::new();
    let (hue_tx, hue_rx) = hue_queue();
    let mut dashboard = Dashboard::new(&config, hue_tx);
    spawn_stdin_reader(ui.handle(), stop.clone())?;

    eprintln!("Type a hue (0-255) and press Enter; q to quit.");

    // The board often resets when the port opens; give the UI a moment first
    let start_at = Instant::now() + config.ui.startup_delay();
    let mut pending_rx = Some(hue_rx);
    let mut link: Option<LinkHandle> = None;

    while !stop.is_set() {
        if Instant::now() >= start_at {
            if let Some(rx) = pending_rx.take() {
                link = Some(start_link(&config.link, args.simulate, rx, &stop, ui.handle())?);
            }
        }

        ui.drain(&mut dashboard);
        dashboard.tick(Instant::now());
        thread::sleep(UI_TICK);
    }

    if let Some(mut link) = link {
        link.stop();
        info!("Link stats: {:?}", link.stats());
    }
    ui.drain(&mut dashboard);

    Ok(())
}

fn start_link(
    config: &LinkConfig,
    simulate: bool,
    outbound: HueReceiver,
    stop: &StopSignal,
    sink: UiHandle<Dashboard>,
) -> anyhow::Result<LinkHandle> {
    let handle = if simulate {
        let opener = SimulatedOpener::new(SIMULATED_PERIOD).garbage_every(25);
        SerialLink::new(config.clone(), opener, outbound, stop.clone(), sink).spawn()
    } else {
        SerialLink::new(config.clone(), SerialOpener, outbound, stop.clone(), sink).spawn()
    };
    handle.context("spawning serial link thread")
}

/// Feed stdin lines to the UI thread as slider moves
fn spawn_stdin_reader(ui: UiHandle<Dashboard>, stop: StopSignal) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
                    stop.set();
                    break;
                }
                match input.parse::<f64>() {
                    Ok(position) => {
                        ui.post(move |dashboard: &mut Dashboard| dashboard.set_hue(position));
                    }
                    Err(_) => eprintln!("Not a number: {input}"),
                }
            }
        })
        .context("spawning stdin reader")?;
    Ok(())
}
