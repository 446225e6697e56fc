//! In-memory stand-ins for the serial halves

use super::SerialSource;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Read half backed by a buffer; reports the unread length as available
pub struct FakeSerial {
    data: Cursor<Vec<u8>>,
}

impl FakeSerial {
    pub fn new(data: &[u8]) -> Self {
        Self {
            data: Cursor::new(data.to_vec()),
        }
    }
}

impl Read for FakeSerial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl SerialSource for FakeSerial {
    fn bytes_available(&mut self) -> io::Result<u32> {
        let remaining = self.data.get_ref().len() as u64 - self.data.position();
        Ok(remaining as u32)
    }
}

/// Like `FakeSerial`, but an exhausted buffer reads as a timeout
pub struct TimeoutSerial {
    inner: FakeSerial,
}

impl TimeoutSerial {
    pub fn new(data: &[u8]) -> Self {
        Self {
            inner: FakeSerial::new(data),
        }
    }
}

impl Read for TimeoutSerial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out")),
            n => Ok(n),
        }
    }
}

impl SerialSource for TimeoutSerial {
    fn bytes_available(&mut self) -> io::Result<u32> {
        self.inner.bytes_available()
    }
}

/// Trickles `count` bytes of `a` followed by `\n`, one byte per `delay`
pub struct SlowSerial {
    remaining: usize,
    delay: Duration,
}

impl SlowSerial {
    pub fn new(count: usize, delay: Duration) -> Self {
        Self {
            remaining: count + 1,
            delay,
        }
    }
}

impl Read for SlowSerial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        thread::sleep(self.delay);
        self.remaining -= 1;
        buf[0] = if self.remaining == 0 { b'\n' } else { b'a' };
        Ok(1)
    }
}

impl SerialSource for SlowSerial {
    fn bytes_available(&mut self) -> io::Result<u32> {
        Ok(self.remaining.min(1) as u32)
    }
}

/// Fails the first `bytes_available` call, then serves `data`
pub struct FlakySerial {
    failed: bool,
    inner: FakeSerial,
}

impl FlakySerial {
    pub fn new(data: &[u8]) -> Self {
        Self {
            failed: false,
            inner: FakeSerial::new(data),
        }
    }
}

impl Read for FlakySerial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl SerialSource for FlakySerial {
    fn bytes_available(&mut self) -> io::Result<u32> {
        if !self.failed {
            self.failed = true;
            return Err(io::Error::new(io::ErrorKind::Other, "Input/output error"));
        }
        self.inner.bytes_available()
    }
}

/// Write half that records every `write` call separately
#[derive(Default)]
pub struct RecordingWriter {
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
}

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Write half that behaves like a device unplugged after `limit` writes
pub struct FailingWriter {
    limit: usize,
    pub attempts: usize,
    pub accepted: Vec<Vec<u8>>,
}

impl FailingWriter {
    pub fn after(limit: usize) -> Self {
        Self {
            limit,
            attempts: 0,
            accepted: Vec::new(),
        }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.attempts += 1;
        if self.accepted.len() >= self.limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device disconnected"));
        }
        self.accepted.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Display sink shared with a background thread
#[derive(Clone, Default)]
pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
