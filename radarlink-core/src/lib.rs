//! RadarLink Core Library
//!
//! Shared types for the RadarLink serial relay: sensor records and their
//! decoder, device identity, the error taxonomy, and static configuration.
//! Used by both the serial crate and the agent binary.

pub mod config;
pub mod decode;
pub mod device;
pub mod error;
pub mod record;

// Re-export commonly used types
pub use config::{default_config_path, DeviceConfig, ForwarderConfig, StaticConfig};
pub use decode::{decode_line, DecodeStats};
pub use device::*;
pub use error::*;
pub use record::*;
