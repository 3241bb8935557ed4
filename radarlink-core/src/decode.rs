//! Record decoding
//!
//! Turns one raw line into a [`SensorRecord`]. Checks run in this order:
//! UTF-8, JSON syntax, then shape. Every failure is a [`DecodeError`] so the
//! caller decides how to report it; nothing here panics on bad input.

use crate::error::{DecodeError, DecodeErrorKind};
use crate::record::SensorRecord;
use serde_json::error::Category;
use serde_json::Value;

/// Decode one raw line (terminator optional) into a record
pub fn decode_line(raw: &[u8]) -> Result<SensorRecord, DecodeError> {
    let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidEncoding {
        bytes: raw.to_vec(),
    })?;

    let value: Value = serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Syntax | Category::Eof => DecodeError::InvalidJson {
            line: trim_terminator(text).to_string(),
            reason: e.to_string(),
        },
        Category::Data | Category::Io => DecodeError::Unknown {
            cause: e.to_string(),
        },
    })?;

    match value {
        Value::Object(fields) => Ok(SensorRecord::from_map(fields)),
        other => Err(DecodeError::UnexpectedShape {
            line: trim_terminator(text).to_string(),
            found: json_type_name(&other),
        }),
    }
}

fn trim_terminator(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n'])
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Running count of decode failures, per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub decoded: u64,
    pub invalid_json: u64,
    pub unexpected_shape: u64,
    pub invalid_encoding: u64,
    pub unknown: u64,
}

impl DecodeStats {
    pub fn record_success(&mut self) {
        self.decoded += 1;
    }

    pub fn record_failure(&mut self, kind: DecodeErrorKind) {
        match kind {
            DecodeErrorKind::InvalidJson => self.invalid_json += 1,
            DecodeErrorKind::UnexpectedShape => self.unexpected_shape += 1,
            DecodeErrorKind::InvalidEncoding => self.invalid_encoding += 1,
            DecodeErrorKind::Unknown => self.unknown += 1,
        }
    }

    pub fn failures(&self, kind: DecodeErrorKind) -> u64 {
        match kind {
            DecodeErrorKind::InvalidJson => self.invalid_json,
            DecodeErrorKind::UnexpectedShape => self.unexpected_shape,
            DecodeErrorKind::InvalidEncoding => self.invalid_encoding,
            DecodeErrorKind::Unknown => self.unknown,
        }
    }

    pub fn total_failures(&self) -> u64 {
        DecodeErrorKind::ALL.iter().map(|k| self.failures(*k)).sum()
    }
}
