//! Synthetic radar device
//!
//! Stands in for real hardware during development: every read immediately
//! yields one well-formed record line. The line generator is pluggable so
//! tests can script exact input.

use crate::transport::LineSource;
use radarlink_core::{RadarLinkError, RadarReading, Result, MAX_MOTION, SYNTHETIC_DEVICE_NAME};
use rand::Rng;

/// Produces one raw line per call
pub type LineGenerator = Box<dyn FnMut() -> Vec<u8> + Send>;

/// Draw a reading in the sensor's range
///
/// Distances are uniform over [2.00, 200.00] in 0.01 cm steps; motion is
/// uniform over [0, 52].
pub fn random_reading<R: Rng + ?Sized>(rng: &mut R) -> RadarReading {
    RadarReading {
        left_distance: rng.gen_range(200..=20000) as f64 / 100.0,
        right_distance: rng.gen_range(200..=20000) as f64 / 100.0,
        motion: rng.gen_range(0..=MAX_MOTION),
    }
}

/// Default generator: a random reading encoded as a `\r\n` line
pub fn random_line() -> Vec<u8> {
    random_reading(&mut rand::thread_rng()).to_line()
}

/// No-I/O device fabricating radar readings
pub struct SyntheticDevice {
    generator: LineGenerator,
    lines_generated: u64,
}

impl SyntheticDevice {
    pub fn new() -> Self {
        Self::with_generator(random_line)
    }

    /// Use a custom line generator, e.g. for deterministic tests
    ///
    /// The generator must never return an empty line: the record reader
    /// treats an empty line as "no data yet" and keeps polling.
    pub fn with_generator<F>(generator: F) -> Self
    where
        F: FnMut() -> Vec<u8> + Send + 'static,
    {
        Self {
            generator: Box::new(generator),
            lines_generated: 0,
        }
    }

    /// Replay the given lines in order, forever
    ///
    /// Fails with `InvalidInput` if there are no lines or any line is empty.
    pub fn cycling(lines: Vec<Vec<u8>>) -> Result<Self> {
        if lines.is_empty() {
            return Err(RadarLinkError::InvalidInput(
                "synthetic device needs at least one line to replay".to_string(),
            ));
        }
        if let Some(pos) = lines.iter().position(|l| l.is_empty()) {
            return Err(RadarLinkError::InvalidInput(format!(
                "synthetic device line {} is empty",
                pos
            )));
        }

        let mut index = 0;
        Ok(Self::with_generator(move || {
            let line = lines[index % lines.len()].clone();
            index += 1;
            line
        }))
    }

    pub fn lines_generated(&self) -> u64 {
        self.lines_generated
    }
}

impl Default for SyntheticDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyntheticDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticDevice")
            .field("lines_generated", &self.lines_generated)
            .finish_non_exhaustive()
    }
}

impl LineSource for SyntheticDevice {
    fn is_readable(&self) -> bool {
        true
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        self.lines_generated += 1;
        Ok((self.generator)())
    }

    fn identifier(&self) -> &str {
        SYNTHETIC_DEVICE_NAME
    }
}
