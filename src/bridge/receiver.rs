//! Device-to-terminal direction
//!
//! Polls the serial read half, pulls one line at a time, decodes it
//! permissively and prints it behind the remote label.

use chrono::Local;
use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

/// Pause after a failed read before polling again
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Read side of a serial link that can report how many bytes are waiting
pub trait SerialSource: Read {
    fn bytes_available(&mut self) -> io::Result<u32>;
}

/// Decode bytes as UTF-8, silently dropping any malformed sequences
pub fn decode_permissive(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Read up to (not including) the next `\n`.
///
/// Passing `deadline`, a read timeout, or end of stream ends the line early
/// and returns whatever was collected, which may be empty.
pub fn read_line<R: Read + ?Sized>(source: &mut R, deadline: Instant) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        if Instant::now() >= deadline {
            break;
        }
        match source.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                buffer.push(byte[0]);
            }
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(buffer)
}

/// Receive loop state
pub struct Receiver<S, W> {
    source: S,
    display: W,
    label: String,
    timeout: Duration,
    poll_interval: Duration,
    timestamps: bool,
}

impl<S: SerialSource, W: Write> Receiver<S, W> {
    pub fn new(source: S, display: W, label: &str) -> Self {
        Self {
            source,
            display,
            label: label.to_string(),
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS),
            timestamps: false,
        }
    }

    /// Upper bound on the time spent reading one line
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Run one poll step. Returns the line that was displayed, if any.
    pub fn poll(&mut self) -> io::Result<Option<String>> {
        if self.source.bytes_available()? == 0 {
            thread::sleep(self.poll_interval);
            return Ok(None);
        }

        let raw = read_line(&mut self.source, Instant::now() + self.timeout)?;
        let text = decode_permissive(&raw);
        let line = text.trim();

        if line.is_empty() {
            log::trace!("discarding blank line ({} raw bytes)", raw.len());
            return Ok(None);
        }

        self.display_line(line)?;
        Ok(Some(line.to_string()))
    }

    fn display_line(&mut self, line: &str) -> io::Result<()> {
        if self.timestamps {
            let timestamp = Local::now().format("%H:%M:%S%.3f");
            writeln!(self.display, "\n[{}] {} >> {}", timestamp, self.label, line)?;
        } else {
            writeln!(self.display, "\n{} >> {}", self.label, line)?;
        }
        self.display.flush()
    }

    /// Poll forever. Errors are logged and never escape.
    pub fn run(mut self) -> ! {
        loop {
            if let Err(e) = self.poll() {
                log::warn!("serial receive error: {}", e);
                thread::sleep(READ_ERROR_BACKOFF);
            }
        }
    }
}
