//! Device identity and serial line settings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Reserved identifier selecting the synthetic device
///
/// Real ports are OS paths (`/dev/ttyUSB0`) or `COMn` names, so a bare
/// lowercase word never collides with one.
pub const SYNTHETIC_DEVICE_NAME: &str = "test";

/// Default baud rate of the radar firmware
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Whether an identifier refers to the synthetic device
pub fn is_synthetic(identifier: &str) -> bool {
    identifier == SYNTHETIC_DEVICE_NAME
}

/// Serial line settings
///
/// Framing is fixed at 8 data bits, no parity, one stop bit, no flow
/// control. Only the baud rate varies. Reads never wait: the read timeout is
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl SerialSettings {
    pub const DATA_BITS: u8 = 8;
    pub const STOP_BITS: u8 = 1;

    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::ZERO,
        }
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} baud {}N{}",
            self.baud_rate,
            Self::DATA_BITS,
            Self::STOP_BITS
        )
    }
}

/// What kind of endpoint a descriptor refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    Synthetic,
    Usb {
        vid: u16,
        pid: u16,
        manufacturer: Option<String>,
        product: Option<String>,
        serial_number: Option<String>,
    },
    Pci,
    Bluetooth,
    Unknown,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Synthetic => write!(f, "synthetic"),
            DeviceKind::Usb {
                vid, pid, product, ..
            } => match product {
                Some(product) => write!(f, "usb {:04X}:{:04X} ({})", vid, pid, product),
                None => write!(f, "usb {:04X}:{:04X}", vid, pid),
            },
            DeviceKind::Pci => write!(f, "pci"),
            DeviceKind::Bluetooth => write!(f, "bluetooth"),
            DeviceKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A device that can be passed to the device factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Identifier accepted by the factory: OS port path or the synthetic name
    pub name: String,
    pub kind: DeviceKind,
}

impl DeviceDescriptor {
    pub fn synthetic() -> Self {
        Self {
            name: SYNTHETIC_DEVICE_NAME.to_string(),
            kind: DeviceKind::Synthetic,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.kind, DeviceKind::Synthetic)
    }
}
