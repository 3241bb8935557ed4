//! Error types for the RadarLink system

use std::fmt;
use thiserror::Error;

/// Core error type for RadarLink operations
///
/// These are connection-level or setup failures. Data-quality faults on
/// individual lines are reported through [`DecodeError`] instead and never
/// stop a polling loop.
#[derive(Error, Debug)]
pub enum RadarLinkError {
    /// The device handle can no longer be read from (unplugged, claimed by
    /// another process, or an invalid path)
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The OS refused to open the device
    #[error("Failed to open device {device}: {reason}")]
    DeviceOpen { device: String, reason: String },

    /// Host port registry could not be queried
    #[error("Failed to enumerate serial ports: {0}")]
    Enumeration(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for RadarLink operations
pub type Result<T> = std::result::Result<T, RadarLinkError>;

/// Classification of a line that could not be turned into a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    InvalidJson,
    UnexpectedShape,
    InvalidEncoding,
    Unknown,
}

impl DecodeErrorKind {
    /// All kinds, in the order they are reported by [`crate::DecodeStats`]
    pub const ALL: [DecodeErrorKind; 4] = [
        DecodeErrorKind::InvalidJson,
        DecodeErrorKind::UnexpectedShape,
        DecodeErrorKind::InvalidEncoding,
        DecodeErrorKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeErrorKind::InvalidJson => "invalid_json",
            DecodeErrorKind::UnexpectedShape => "unexpected_shape",
            DecodeErrorKind::InvalidEncoding => "invalid_encoding",
            DecodeErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal failure to decode one raw line
///
/// Each variant keeps the offending payload so it can be logged. Text
/// payloads are kept as received (terminator trimmed); undecodable bytes are
/// kept raw.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Line is not syntactically valid JSON
    #[error("Malformed JSON ({reason}): {line:?}")]
    InvalidJson { line: String, reason: String },

    /// Line is valid JSON but not an object
    #[error("Expected a JSON object, got {found}: {line:?}")]
    UnexpectedShape { line: String, found: &'static str },

    /// Line is not valid UTF-8
    #[error("Invalid UTF-8 encoding: {bytes:?}")]
    InvalidEncoding { bytes: Vec<u8> },

    /// Anything else that went wrong while decoding
    #[error("Unknown decode error: {cause}")]
    Unknown { cause: String },
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::InvalidJson { .. } => DecodeErrorKind::InvalidJson,
            DecodeError::UnexpectedShape { .. } => DecodeErrorKind::UnexpectedShape,
            DecodeError::InvalidEncoding { .. } => DecodeErrorKind::InvalidEncoding,
            DecodeError::Unknown { .. } => DecodeErrorKind::Unknown,
        }
    }
}
