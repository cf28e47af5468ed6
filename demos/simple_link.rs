//! Simple link example
//!
//! Prints frames from a board and sweeps the hue once per second.
//!
//! Usage:
//!   cargo run --example simple_link -- /dev/ttyACM0 115200
//!   cargo run --example simple_link -- --simulate

use hwlink_core::{
    hue_queue, list_ports, HueCommand, LinkConfig, SensorFrame, SerialLink, SerialOpener,
    SimulatedOpener, StopSignal,
};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let simulate = args.iter().any(|a| a == "--simulate");

    let config = match args.len() {
        _ if simulate => LinkConfig::default(),
        3 => LinkConfig::new(&args[1], args[2].parse().unwrap_or(115_200)),
        2 => LinkConfig::new(&args[1], 115_200),
        _ => {
            println!("Usage: simple_link <port> [baud_rate] | --simulate");
            println!("\nAvailable ports:");
            for port in list_ports()? {
                println!("  {}", port.port_name);
            }
            return Ok(());
        }
    };

    let (hue_tx, hue_rx) = hue_queue();
    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.set())?;
    }

    let print = |frame: SensorFrame| println!("{frame}");
    let mut handle = if simulate {
        SerialLink::new(config, SimulatedOpener::new(Duration::from_millis(250)), hue_rx, stop.clone(), print)
            .spawn()?
    } else {
        SerialLink::new(config, SerialOpener, hue_rx, stop.clone(), print).spawn()?
    };

    println!("Running. Press Ctrl+C to exit.\n");

    let mut hue: u8 = 0;
    while !stop.wait_timeout(Duration::from_secs(1)) {
        hue = hue.wrapping_add(32);
        hue_tx.push(HueCommand::new(hue));
    }

    handle.stop();
    println!("\n{:?}", handle.stats());
    Ok(())
}
