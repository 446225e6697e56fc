//! Full-duplex terminal bridge
//!
//! The serial connection is split into a read half and a write half:
//! - the receiver owns the read half on a detached background thread
//! - the transmitter owns the write half on the calling thread
//!
//! Neither direction touches the other, so no locking is involved.

pub mod receiver;
pub mod transmitter;

#[cfg(test)]
pub(crate) mod testing;

pub use receiver::{Receiver, SerialSource};
pub use transmitter::Transmitter;

use anyhow::{Context, Result};
use std::io::Write;
use std::thread;

#[cfg(feature = "serial")]
use crate::config::BridgeConfig;
#[cfg(feature = "serial")]
use crate::serial::{PortConfig, SerialConnection};
#[cfg(feature = "serial")]
use colored::Colorize;

/// Start the receiver on its own thread. The handle is dropped: the thread
/// lives until the process exits.
pub fn spawn_receiver<S, W>(receiver: Receiver<S, W>) -> Result<()>
where
    S: SerialSource + Send + 'static,
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("uart-rx".into())
        .spawn(move || {
            receiver.run();
        })
        .with_context(|| "Failed to spawn receiver thread")?;

    log::debug!("receiver thread started");
    Ok(())
}

/// Open the port and bridge it to stdin/stdout until input closes or a write fails
#[cfg(feature = "serial")]
pub fn run_bridge(config: &BridgeConfig) -> Result<()> {
    let connection = SerialConnection::open(PortConfig::from(config))?;

    let port = connection.config();
    println!(
        "{} Connected to {} at {} baud",
        "[OK]".green().bold(),
        port.port_path.white().bold(),
        port.baud_rate
    );

    let (reader, writer) = connection.split()?;

    println!("{}", format!("{} UART Dual Mode Ready", config.local_label).cyan().bold());
    println!("Type and press Enter");

    let receiver = Receiver::new(reader, std::io::stdout(), &config.remote_label)
        .with_timeout(config.timeout())
        .with_poll_interval(config.poll_interval())
        .with_timestamps(config.timestamps);
    spawn_receiver(receiver)?;

    let mut transmitter = Transmitter::new(writer, config.line_ending);
    transmitter.run(std::io::stdin().lock(), std::io::stdout(), &config.prompt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{FakeSerial, FlakySerial, SharedBuffer};
    use std::time::{Duration, Instant};

    #[test]
    fn test_background_receiver_displays_lines() {
        let display = SharedBuffer::default();
        let receiver = Receiver::new(FakeSerial::new(b"boot ok\n\xff\nready\n"), display.clone(), "ESP32")
            .with_poll_interval(Duration::from_millis(1));

        spawn_receiver(receiver).unwrap();

        let expected = "\nESP32 >> boot ok\n\nESP32 >> ready\n";
        let deadline = Instant::now() + Duration::from_secs(2);
        while display.contents() != expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(display.contents(), expected);
    }

    #[test]
    fn test_receive_error_does_not_stop_receiver() {
        let display = SharedBuffer::default();
        let receiver = Receiver::new(FlakySerial::new(b"ok\n"), display.clone(), "ESP32")
            .with_poll_interval(Duration::from_millis(1));

        spawn_receiver(receiver).unwrap();

        let expected = "\nESP32 >> ok\n";
        let deadline = Instant::now() + Duration::from_secs(2);
        while display.contents() != expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(display.contents(), expected);
    }
}
