//! UART Bridge
//!
//! An interactive, full-duplex bridge between a terminal and a device on a
//! serial (UART) link. Lines arriving from the device are printed as they come
//! in, while lines typed at the terminal are sent to the device.
//!
//! # Usage
//!
//! ```bash
//! # List available serial ports
//! uart-bridge ports
//!
//! # Bridge the default port (/dev/serial0 on Linux) at 9600 baud
//! uart-bridge run
//!
//! # Bridge a USB adapter with custom labels
//! uart-bridge run -p /dev/ttyUSB0 -b 115200 --remote-label MCU --local-label PC
//!
//! # Send a single line and exit
//! uart-bridge send -p /dev/ttyUSB0 "led on"
//!
//! # Print a starting config file
//! uart-bridge config > bridge.toml
//! ```

mod bridge;
mod config;
#[cfg(feature = "serial")]
mod serial;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use config::{BridgeConfig, LineEnding, Overrides};

#[cfg(feature = "serial")]
use colored::Colorize;

/// UART Bridge
///
/// Interactive terminal bridge for serial devices
#[derive(Parser)]
#[command(name = "uart-bridge")]
#[command(version)]
#[command(about = "Full-duplex terminal bridge for UART devices")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bridge the terminal to a serial port
    #[cfg(feature = "serial")]
    Run(SettingsArgs),

    /// List available serial ports
    #[cfg(feature = "serial")]
    Ports,

    /// Send one line to the serial port and exit
    #[cfg(feature = "serial")]
    Send {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Text to send (the line terminator is appended)
        text: String,
    },

    /// Print the effective configuration as TOML
    Config(SettingsArgs),
}

/// Settings shared by every command that touches the configuration
#[derive(Args, Debug, Clone)]
struct SettingsArgs {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port path (e.g., /dev/serial0, /dev/ttyUSB0, COM3)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Read timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Label shown before lines received from the device
    #[arg(long)]
    remote_label: Option<String>,

    /// Label used for the input prompt
    #[arg(long)]
    local_label: Option<String>,

    /// Line terminator appended to sent lines
    #[arg(long, value_enum)]
    line_ending: Option<LineEnding>,

    /// Prefix received lines with the local time
    #[arg(long)]
    timestamps: bool,
}

impl SettingsArgs {
    fn resolve(self) -> Result<BridgeConfig> {
        let overrides = Overrides {
            port: self.port,
            baud_rate: self.baud,
            timeout_ms: self.timeout_ms,
            remote_label: self.remote_label,
            local_label: self.local_label,
            line_ending: self.line_ending,
            timestamps: self.timestamps,
        };
        Ok(BridgeConfig::resolve(self.config.as_deref(), overrides)?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        #[cfg(feature = "serial")]
        Commands::Run(settings) => {
            let config = settings.resolve()?;
            log::debug!("effective configuration: {:?}", config);
            bridge::run_bridge(&config)
        }
        #[cfg(feature = "serial")]
        Commands::Ports => serial::port::print_ports(),
        #[cfg(feature = "serial")]
        Commands::Send { settings, text } => handle_send(settings, &text),
        Commands::Config(settings) => {
            let config = settings.resolve()?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

#[cfg(feature = "serial")]
fn handle_send(settings: SettingsArgs, text: &str) -> Result<()> {
    let config = settings.resolve()?;
    let connection = serial::SerialConnection::open(serial::PortConfig::from(&config))?;
    let writer = connection.into_writer();

    println!(
        "{} Sending to {} at {} baud: {}",
        "[TX]".cyan().bold(),
        config.port,
        config.baud_rate,
        text
    );

    let mut transmitter = bridge::Transmitter::new(writer, config.line_ending);
    transmitter.send_line(text)?;

    println!("{}", "[OK] Line sent".green());
    Ok(())
}
