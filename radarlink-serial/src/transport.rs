//! Line transport over a byte stream
//!
//! Frames a raw byte stream into `\n`-terminated lines without ever waiting
//! on the device: each `read_line` does at most one zero-timeout read.

use radarlink_core::{RadarLinkError, Result};
use std::io::{ErrorKind, Read};
use tokio_serial::SerialPort;
use tracing::{debug, error, warn};

/// Bytes buffered without a terminator before they are flushed as one line
pub const MAX_LINE_LEN: usize = 4096;

const READ_CHUNK: usize = 256;

/// Capability set shared by every device the factory can hand out
///
/// This is what the record reader polls. Both the real serial transport and
/// the synthetic device implement it, and tests can provide their own.
pub trait LineSource: Send {
    /// Whether the device currently supports reads. Side-effect free.
    fn is_readable(&self) -> bool;

    /// Return the next complete line (terminator included), or an empty
    /// vector if none is available yet.
    ///
    /// Fails with `DeviceUnavailable` when the device cannot be read.
    fn read_line(&mut self) -> Result<Vec<u8>>;

    /// Identifier the device was opened with
    fn identifier(&self) -> &str;

    /// Release the device. Later reads fail with `DeviceUnavailable` where
    /// the device holds an OS handle.
    fn close(&mut self) {}
}

/// A readable byte stream that can report whether it is still open
///
/// Abstracts the OS serial handle so the transport can be tested without
/// hardware.
pub trait ByteStream: Read + Send {
    /// Whether the underlying handle is still usable
    fn is_open(&self) -> bool;
}

impl ByteStream for Box<dyn SerialPort> {
    fn is_open(&self) -> bool {
        // Fails once the OS has reclaimed the port (unplugged, revoked)
        self.bytes_to_read().is_ok()
    }
}

/// Line transport bound to one device handle
///
/// Owns the handle exclusively for its lifetime; dropping the transport or
/// calling [`LineTransport::close`] releases it.
pub struct LineTransport<S: ByteStream = Box<dyn SerialPort>> {
    stream: Option<S>,
    identifier: String,
    pending: Vec<u8>,
    faulted: bool,
}

impl<S: ByteStream> LineTransport<S> {
    pub fn new(identifier: impl Into<String>, stream: S) -> Self {
        Self {
            stream: Some(stream),
            identifier: identifier.into(),
            pending: Vec::new(),
            faulted: false,
        }
    }

    /// Bytes received but not yet returned as a line
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    fn unavailable(&self, reason: &str) -> RadarLinkError {
        error!("Cannot read from {}: {}", self.identifier, reason);
        error!("Check that the device is connected and not in use by another process");
        RadarLinkError::DeviceUnavailable(format!("{}: {}", self.identifier, reason))
    }

    /// Split the next line off the pending buffer, if there is one
    fn take_line(&mut self) -> Option<Vec<u8>> {
        if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            return Some(self.pending.drain(..=pos).collect());
        }

        if self.pending.len() >= MAX_LINE_LEN {
            warn!(
                "{}: no line terminator within {} bytes, flushing",
                self.identifier, MAX_LINE_LEN
            );
            return Some(std::mem::take(&mut self.pending));
        }

        None
    }
}

impl<S: ByteStream> LineSource for LineTransport<S> {
    fn is_readable(&self) -> bool {
        !self.faulted && self.stream.as_ref().is_some_and(|s| s.is_open())
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        if !self.is_readable() {
            let reason = if self.stream.is_none() {
                "port is closed"
            } else {
                "port is not readable"
            };
            return Err(self.unavailable(reason));
        }

        if let Some(line) = self.take_line() {
            return Ok(line);
        }

        let mut chunk = [0u8; READ_CHUNK];
        let read = match self.stream.as_mut().map(|s| s.read(&mut chunk)) {
            Some(read) => read,
            None => return Err(self.unavailable("port is closed")),
        };

        match read {
            Ok(0) => {
                // EOF on a serial handle means the device went away
                self.faulted = true;
                return Err(self.unavailable("end of stream"));
            }
            Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(e) => {
                self.faulted = true;
                return Err(self.unavailable(&e.to_string()));
            }
        }

        Ok(self.take_line().unwrap_or_default())
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("Closed {}", self.identifier);
        }
        self.pending.clear();
    }
}
