//! Configuration types for RadarLink
//!
//! A single TOML file holds the device and forwarder settings. It is read
//! once at startup; environment variables and CLI flags override it.

mod paths;
mod static_config;

pub use paths::default_config_path;
pub use static_config::{DeviceConfig, ForwarderConfig, StaticConfig};
