//! Hwlink CLI - command-line tools for the sensor link
//!
//! Port discovery, frame monitoring and one-shot hue writes for scripting.

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::RecvTimeoutError;
use hwlink_core::cli::print_exit_codes;
use hwlink_core::{
    encode_hue, hue_queue, init_logging, list_ports, AppConfig, CliResult, ExitCodes, FrameSink,
    LinkConfig, LinkStatus, PortOpener, SensorFrame, SerialLink, SerialOpener, SimulatedOpener,
    StopSignal,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

/// CLI output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON lines for scripting
    Json,
    /// CSV format
    Csv,
}

/// Hwlink CLI
#[derive(Parser, Debug)]
#[command(
    name = "hwlink-cli",
    version,
    about = "Tools for the hwlink sensor board",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "HWLINK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    ListPorts {
        /// Show detailed info
        #[arg(short, long)]
        detailed: bool,
    },

    /// Print decoded frames from the board
    Monitor {
        /// Serial port name (e.g., /dev/ttyACM0, COM3)
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Exit after this many frames
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Exit after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Read from a simulated board
        #[arg(long)]
        simulate: bool,
    },

    /// Write one hue byte to the board
    SendHue {
        /// Hue value 0-255
        value: u8,

        /// Serial port name
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the exit code table
    ExitCodes,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match run(&cli) {
        Ok(result) => result,
        Err(e) => CliResult::from_error(&e),
    };

    if let Some(msg) = result.message() {
        if result.is_success() {
            if !cli.quiet {
                eprintln!("{msg}");
            }
        } else {
            eprintln!("Error: {msg}");
        }
    }
    result.to_exit_code()
}

fn run(cli: &Cli) -> anyhow::Result<CliResult> {
    let config = load_config(cli)?;

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    } else if cli.quiet {
        logging.level = "error".to_string();
    }
    let _log_guard = init_logging(&logging);

    match &cli.command {
        Commands::ListPorts { detailed } => list(cli, *detailed),
        Commands::Monitor {
            port,
            baud,
            count,
            timeout,
            simulate,
        } => {
            let link = link_config(&config, port.as_deref(), *baud)?;
            monitor(cli, link, *count, timeout.map(Duration::from_secs), *simulate)
        }
        Commands::SendHue { value, port, baud } => {
            let link = link_config(&config, port.as_deref(), *baud)?;
            send_hue(&link, *value)
        }
        Commands::Config { action } => handle_config(cli, &config, action),
        Commands::ExitCodes => {
            print_exit_codes();
            Ok(CliResult::success())
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    match &cli.config {
        // `config init --config <new file>` must work before the file exists
        Some(path) if !path.exists() && matches!(cli.command, Commands::Config { .. }) => {
            Ok(AppConfig::default())
        }
        Some(path) => {
            AppConfig::load_from(path).with_context(|| format!("loading {}", path.display()))
        }
        None => AppConfig::load().context("loading config"),
    }
}

fn link_config(config: &AppConfig, port: Option<&str>, baud: Option<u32>) -> anyhow::Result<LinkConfig> {
    let mut link = config.link.clone();
    if let Some(port) = port {
        link.device = port.to_string();
    }
    if let Some(baud) = baud {
        link.baud_rate = baud;
    }
    link.validate()?;
    Ok(link)
}

fn list(cli: &Cli, detailed: bool) -> anyhow::Result<CliResult> {
    let ports = list_ports()?;

    if ports.is_empty() {
        if !cli.quiet {
            println!("No serial ports found.");
        }
        return Ok(CliResult::success());
    }

    match cli.format {
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = ports
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.port_name,
                        "type": format!("{:?}", p.port_type)
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            println!("name,type");
            for port in &ports {
                println!("{},{:?}", port.port_name, port.port_type);
            }
        }
        OutputFormat::Text => {
            if detailed {
                println!("Available Serial Ports:");
                println!("{:-<60}", "");
                for port in &ports {
                    println!("  {} [{:?}]", port.port_name, port.port_type);
                }
            } else {
                for port in &ports {
                    println!("{}", port.port_name);
                }
            }
        }
    }

    Ok(CliResult::success())
}

/// Forwards frames and status to the main thread
struct ChannelSink {
    frames: crossbeam_channel::Sender<SensorFrame>,
    quiet: bool,
}

impl FrameSink for ChannelSink {
    fn deliver(&self, frame: SensorFrame) {
        let _ = self.frames.send(frame);
    }

    fn on_status(&self, status: LinkStatus) {
        if !self.quiet {
            eprintln!("[{status}]");
        }
    }
}

fn monitor(
    cli: &Cli,
    link: LinkConfig,
    count: Option<u64>,
    timeout: Option<Duration>,
    simulate: bool,
) -> anyhow::Result<CliResult> {
    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.set()).context("installing Ctrl+C handler")?;
    }

    let (frames_tx, frames) = crossbeam_channel::unbounded();
    let sink = ChannelSink {
        frames: frames_tx,
        quiet: cli.quiet,
    };
    // Monitor never sends; keep the sender alive so the queue stays open
    let (_hue_tx, hue_rx) = hue_queue();

    let mut handle = if simulate {
        let opener = SimulatedOpener::new(Duration::from_millis(100));
        SerialLink::new(link, opener, hue_rx, stop.clone(), sink).spawn()?
    } else {
        SerialLink::new(link, SerialOpener, hue_rx, stop.clone(), sink).spawn()?
    };

    if cli.format == OutputFormat::Csv {
        println!("timestamp,pot,temperature,humidity");
    }

    let deadline = timeout.map(|t| Instant::now() + t);
    let mut received = 0u64;
    while !stop.is_set() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        match frames.recv_timeout(Duration::from_millis(100)) {
            Ok(frame) => {
                print_frame(cli.format, &frame)?;
                received += 1;
                if count.is_some_and(|n| received >= n) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    handle.stop();
    let stats = handle.stats();
    if cli.verbose && !cli.quiet {
        eprintln!(
            "{} frames, {} dropped lines, {} reconnects",
            stats.frames_decoded,
            stats.lines_dropped,
            stats.connects.saturating_sub(1)
        );
    }

    Ok(CliResult::success())
}

fn print_frame(format: OutputFormat, frame: &SensorFrame) -> anyhow::Result<()> {
    let now = Local::now();
    match format {
        OutputFormat::Text => println!("[{}] {}", now.format("%H:%M:%S%.3f"), frame),
        OutputFormat::Csv => println!(
            "{},{},{},{}",
            now.to_rfc3339(),
            frame.pot,
            frame.temperature,
            frame.humidity
        ),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "timestamp": now.to_rfc3339(),
                "pot": frame.pot,
                "temperature": frame.temperature,
                "humidity": frame.humidity,
            });
            println!("{}", serde_json::to_string(&json)?);
        }
    }
    Ok(())
}

fn send_hue(link: &LinkConfig, value: u8) -> anyhow::Result<CliResult> {
    if !link.hue_range.contains(i32::from(value)) {
        return Ok(CliResult::error(
            ExitCodes::INVALID_ARGS,
            format!(
                "Hue {} outside configured range {}..={}",
                value, link.hue_range.min, link.hue_range.max
            ),
        ));
    }

    let mut port = SerialOpener.open(link)?;
    port.write_bytes(&encode_hue(value))?;
    Ok(CliResult::success_with_message(format!(
        "Sent hue {} to {}",
        value,
        port.name()
    )))
}

fn handle_config(cli: &Cli, config: &AppConfig, action: &ConfigAction) -> anyhow::Result<CliResult> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };

    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Show => match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            _ => print!("{}", toml::to_string_pretty(config)?),
        },
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Ok(CliResult::error(
                    ExitCodes::CONFIG_ERROR,
                    format!("{} already exists (use --force)", path.display()),
                ));
            }
            AppConfig::default().save_to(&path)?;
            return Ok(CliResult::success_with_message(format!(
                "Wrote {}",
                path.display()
            )));
        }
    }

    Ok(CliResult::success())
}
