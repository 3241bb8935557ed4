//! Record reader
//!
//! Polls a [`LineSource`] until a line arrives, then decodes it. Malformed
//! lines are logged and turned into an empty record; only connection-level
//! failures propagate.

use crate::factory::Device;
use crate::transport::LineSource;
use radarlink_core::{decode_line, DecodeError, DecodeStats, Result, SensorRecord};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Default pause between empty polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Polling state while waiting for a line
enum PollState {
    Waiting { polls: u64 },
    HaveLine(Vec<u8>),
    TimedOut { polls: u64 },
}

/// Decodes sensor records from a line source
pub struct RecordReader<S: LineSource = Device> {
    source: S,
    poll_interval: Duration,
    stats: DecodeStats,
}

impl<S: LineSource> RecordReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_poll_interval(source, DEFAULT_POLL_INTERVAL)
    }

    /// Pause `poll_interval` after each empty poll; zero spins
    pub fn with_poll_interval(source: S, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
            stats: DecodeStats::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Poll until the source yields a non-empty line
    ///
    /// There is no timeout: this returns only with a line or with the
    /// source's connection error.
    pub fn next_line(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(line) = self.poll_line(None)? {
                return Ok(line);
            }
        }
    }

    /// Poll for at most `max_wait`; `None` if no line arrived in time
    ///
    /// The source is always read at least once.
    pub fn next_line_within(&mut self, max_wait: Duration) -> Result<Option<Vec<u8>>> {
        self.poll_line(Some(Instant::now() + max_wait))
    }

    fn poll_line(&mut self, deadline: Option<Instant>) -> Result<Option<Vec<u8>>> {
        let mut state = PollState::Waiting { polls: 0 };
        loop {
            state = match state {
                PollState::HaveLine(line) => return Ok(Some(line)),
                PollState::TimedOut { polls } => {
                    trace!("No line after {} empty poll(s)", polls);
                    return Ok(None);
                }
                PollState::Waiting { polls } => {
                    let line = self.source.read_line()?;
                    if !line.is_empty() {
                        trace!("Line after {} empty poll(s)", polls);
                        PollState::HaveLine(line)
                    } else if deadline.is_some_and(|d| Instant::now() >= d) {
                        PollState::TimedOut { polls: polls + 1 }
                    } else {
                        if !self.poll_interval.is_zero() {
                            std::thread::sleep(self.poll_interval);
                        }
                        PollState::Waiting { polls: polls + 1 }
                    }
                }
            };
        }
    }

    /// Read and decode one line, keeping the decode failure detail
    pub fn next_outcome(&mut self) -> Result<std::result::Result<SensorRecord, DecodeError>> {
        let line = self.next_line()?;
        Ok(self.decode(&line))
    }

    /// Read one record
    ///
    /// Returns an empty record when the line could not be decoded. Fails
    /// only when the source does.
    pub fn read_record(&mut self) -> Result<SensorRecord> {
        let line = self.next_line()?;
        Ok(self.record_from(&line))
    }

    /// Like [`RecordReader::read_record`], but gives up after `max_wait`
    ///
    /// Returns `None` if the source stayed silent. Callers that must stay
    /// responsive (e.g. to shutdown) loop over this instead of blocking in
    /// `read_record`.
    pub fn read_record_within(&mut self, max_wait: Duration) -> Result<Option<SensorRecord>> {
        Ok(self
            .next_line_within(max_wait)?
            .map(|line| self.record_from(&line)))
    }

    fn decode(&mut self, line: &[u8]) -> std::result::Result<SensorRecord, DecodeError> {
        let outcome = decode_line(line);
        match &outcome {
            Ok(_) => self.stats.record_success(),
            Err(e) => self.stats.record_failure(e.kind()),
        }
        outcome
    }

    fn record_from(&mut self, line: &[u8]) -> SensorRecord {
        match self.decode(line) {
            Ok(record) => record,
            Err(e) => {
                match &e {
                    DecodeError::InvalidEncoding { bytes } => {
                        warn!(kind = %e.kind(), "Received badly encoded data: {:?}", bytes)
                    }
                    DecodeError::Unknown { cause } => {
                        warn!(kind = %e.kind(), "Unknown error while decoding: {}", cause)
                    }
                    DecodeError::InvalidJson { line, .. }
                    | DecodeError::UnexpectedShape { line, .. } => {
                        warn!(kind = %e.kind(), "Received invalid data: {:?} ({})", line, e)
                    }
                }
                SensorRecord::empty()
            }
        }
    }
}
