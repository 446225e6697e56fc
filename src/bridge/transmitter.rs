//! Terminal-to-device direction

use crate::config::LineEnding;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Encode one line for the wire
pub fn encode_line(text: &str, ending: LineEnding) -> Vec<u8> {
    let mut frame = Vec::with_capacity(text.len() + 2);
    frame.extend_from_slice(text.as_bytes());
    frame.extend_from_slice(ending.as_str().as_bytes());
    frame
}

/// Strip the `\n` left by `read_line`; any other trailing bytes are sent as typed
fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

/// Writes typed lines to the serial write half
pub struct Transmitter<W> {
    sink: W,
    line_ending: LineEnding,
}

impl<W: Write> Transmitter<W> {
    pub fn new(sink: W, line_ending: LineEnding) -> Self {
        Self { sink, line_ending }
    }

    /// Send `text` plus the line terminator as a single write
    pub fn send_line(&mut self, text: &str) -> Result<()> {
        let frame = encode_line(text, self.line_ending);
        self.sink
            .write_all(&frame)
            .with_context(|| "Failed to write to serial port")?;
        self.sink
            .flush()
            .with_context(|| "Failed to flush serial port")?;
        log::debug!("sent {} bytes", frame.len());
        Ok(())
    }

    /// Prompt, read a line, send it; repeat until input closes.
    ///
    /// A write failure ends the loop with an error.
    pub fn run<R: BufRead, O: Write>(&mut self, mut input: R, mut prompt_out: O, prompt: &str) -> Result<()> {
        let mut line = String::new();

        loop {
            write!(prompt_out, "{}", prompt)?;
            prompt_out.flush()?;

            line.clear();
            let read = input
                .read_line(&mut line)
                .with_context(|| "Failed to read from standard input")?;
            if read == 0 {
                log::debug!("input closed, stopping transmitter");
                return Ok(());
            }

            self.send_line(strip_newline(&line))?;
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.sink
    }
}
