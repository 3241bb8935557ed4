//! Sensor record types
//!
//! A [`SensorRecord`] is whatever JSON object the radar emitted on one line.
//! Only "is a JSON object" is enforced; the well-known fields are read
//! through typed accessors so extra keys survive untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name for the left distance, in centimeters
pub const LEFT_DISTANCE_KEY: &str = "L_Dist";
/// Field name for the right distance, in centimeters
pub const RIGHT_DISTANCE_KEY: &str = "R_Dist";
/// Field name for the motion/velocity indicator
pub const MOTION_KEY: &str = "Mv";

/// Smallest distance the sensor reports, in centimeters
pub const MIN_DISTANCE_CM: f64 = 2.0;
/// Largest distance the sensor reports, in centimeters
pub const MAX_DISTANCE_CM: f64 = 200.0;
/// Largest motion indicator value
pub const MAX_MOTION: u8 = 52;

/// One decoded telemetry sample
///
/// An empty record means "no usable data this cycle". It is never a valid
/// sample with all fields absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorRecord(Map<String, Value>);

impl SensorRecord {
    /// The "no usable data" record
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Left distance in centimeters, if present and numeric
    pub fn left_distance(&self) -> Option<f64> {
        self.get(LEFT_DISTANCE_KEY).and_then(Value::as_f64)
    }

    /// Right distance in centimeters, if present and numeric
    pub fn right_distance(&self) -> Option<f64> {
        self.get(RIGHT_DISTANCE_KEY).and_then(Value::as_f64)
    }

    /// Motion indicator, if present and an integer
    ///
    /// Integral floats such as `7.0` are accepted.
    pub fn motion(&self) -> Option<i64> {
        let value = self.get(MOTION_KEY)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|v| v.fract() == 0.0 && v.is_finite())
                .map(|v| v as i64)
        })
    }

    /// Typed view of the three well-known fields
    ///
    /// Returns `None` when any of them is missing or has the wrong type.
    pub fn reading(&self) -> Option<RadarReading> {
        let motion = u8::try_from(self.motion()?).ok()?;
        Some(RadarReading {
            left_distance: self.left_distance()?,
            right_distance: self.right_distance()?,
            motion,
        })
    }

    /// Encode as a single JSON line without terminator
    pub fn to_json_string(&self) -> String {
        // A map of JSON values always serializes
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Map<String, Value>> for SensorRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<RadarReading> for SensorRecord {
    fn from(reading: RadarReading) -> Self {
        let mut fields = Map::new();
        fields.insert(LEFT_DISTANCE_KEY.to_string(), reading.left_distance.into());
        fields.insert(RIGHT_DISTANCE_KEY.to_string(), reading.right_distance.into());
        fields.insert(MOTION_KEY.to_string(), reading.motion.into());
        Self(fields)
    }
}

/// The three fields the radar reports on every line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarReading {
    #[serde(rename = "L_Dist")]
    pub left_distance: f64,
    #[serde(rename = "R_Dist")]
    pub right_distance: f64,
    #[serde(rename = "Mv")]
    pub motion: u8,
}

impl RadarReading {
    /// Whether every field lies within the sensor's documented range
    pub fn is_within_range(&self) -> bool {
        let distance_ok = |d: f64| (MIN_DISTANCE_CM..=MAX_DISTANCE_CM).contains(&d);
        distance_ok(self.left_distance)
            && distance_ok(self.right_distance)
            && self.motion <= MAX_MOTION
    }

    /// Encode as one wire line, `\r\n` terminated
    pub fn to_line(&self) -> Vec<u8> {
        let mut line = SensorRecord::from(*self).to_json_string().into_bytes();
        line.extend_from_slice(b"\r\n");
        line
    }
}
