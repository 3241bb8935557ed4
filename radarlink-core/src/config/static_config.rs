//! Static configuration loaded once at startup

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::device::DEFAULT_BAUD_RATE;
use crate::error::{RadarLinkError, Result};

/// Environment variable overriding [`DeviceConfig::path`]
pub const ENV_DEVICE: &str = "RADARLINK_DEVICE";
/// Environment variable overriding [`DeviceConfig::baud_rate`]
pub const ENV_BAUD_RATE: &str = "RADARLINK_BAUD_RATE";
/// Environment variable overriding [`ForwarderConfig::target_url`]
pub const ENV_TARGET_URL: &str = "RADARLINK_TARGET_URL";

/// Serial device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device identifier; prompt interactively when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Pause between empty polls in milliseconds (0 spins)
    pub poll_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: None,
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval_ms: 5,
        }
    }
}

impl DeviceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// HTTP forwarder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Collector endpoint receiving the form posts
    pub target_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Pause after each forwarded record in milliseconds
    pub cycle_delay_ms: u64,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            target_url: "http://localhost:8000/sensor/radar/".to_string(),
            timeout_secs: 10,
            cycle_delay_ms: 200,
        }
    }
}

impl ForwarderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }
}

/// Static configuration for the RadarLink agent.
///
/// Located at `~/.config/radarlink/config.toml` by default. Every field has
/// a default, so a partial or missing file is fine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub device: DeviceConfig,
    pub forwarder: ForwarderConfig,
}

impl StaticConfig {
    /// Load from a file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            RadarLinkError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
            .map_err(|e| RadarLinkError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Parse StaticConfig from TOML string.
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize StaticConfig to TOML string.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply `RADARLINK_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(device) = lookup(ENV_DEVICE) {
            self.device.path = Some(device);
        }

        if let Some(baud) = lookup(ENV_BAUD_RATE) {
            self.device.baud_rate = baud.parse().map_err(|_| {
                RadarLinkError::Config(format!("{} must be an integer, got {:?}", ENV_BAUD_RATE, baud))
            })?;
        }

        if let Some(url) = lookup(ENV_TARGET_URL) {
            self.forwarder.target_url = url;
        }

        Ok(())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.device.baud_rate == 0 {
            return Err(RadarLinkError::Config(
                "baud_rate must be greater than zero".to_string(),
            ));
        }

        let url = &self.forwarder.target_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RadarLinkError::Config(format!(
                "target_url must start with http:// or https://, got {:?}",
                url
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_static_config() {
        let config = StaticConfig::default();
        assert_eq!(config.device.path, None);
        assert_eq!(config.device.baud_rate, 9600);
        assert_eq!(config.device.poll_interval(), Duration::from_millis(5));
        assert_eq!(
            config.forwarder.target_url,
            "http://localhost:8000/sensor/radar/"
        );
        assert_eq!(config.forwarder.cycle_delay(), Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_static_config_serialization() {
        let config = StaticConfig::default();
        let toml_str = config.to_toml().unwrap();

        assert!(toml_str.contains("[device]"));
        assert!(toml_str.contains("[forwarder]"));
        assert!(toml_str.contains("target_url"));
    }

    #[test]
    fn test_static_config_deserialization() {
        let toml_str = r#"
            [device]
            path = "/dev/ttyUSB0"
            baud_rate = 115200
            poll_interval_ms = 0

            [forwarder]
            target_url = "https://collector.local/radar/"
            timeout_secs = 3
            cycle_delay_ms = 50
        "#;

        let config = StaticConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.device.path.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.device.baud_rate, 115200);
        assert_eq!(config.device.poll_interval(), Duration::ZERO);
        assert_eq!(config.forwarder.target_url, "https://collector.local/radar/");
        assert_eq!(config.forwarder.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
            [device]
            path = "test"
        "#;

        let config = StaticConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.device.path.as_deref(), Some("test"));
        assert_eq!(config.device.baud_rate, 9600);
        assert_eq!(config.forwarder, ForwarderConfig::default());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StaticConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, StaticConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[forwarder]\ncycle_delay_ms = 1000\n").unwrap();

        let config = StaticConfig::load(&path).unwrap();
        assert_eq!(config.forwarder.cycle_delay_ms, 1000);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[device\nbaud_rate = ").unwrap();

        let err = StaticConfig::load(&path).unwrap_err();
        assert!(matches!(err, RadarLinkError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DEVICE, "/dev/ttyACM1"),
            (ENV_BAUD_RATE, "19200"),
            (ENV_TARGET_URL, "http://10.0.0.2:8000/sensor/radar/"),
        ]
        .into_iter()
        .collect();

        let mut config = StaticConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.device.path.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(config.device.baud_rate, 19200);
        assert_eq!(
            config.forwarder.target_url,
            "http://10.0.0.2:8000/sensor/radar/"
        );
    }

    #[test]
    fn test_override_bad_baud_rate() {
        let mut config = StaticConfig::default();
        let result = config.apply_overrides(|key| {
            (key == ENV_BAUD_RATE).then(|| "fast".to_string())
        });
        assert!(matches!(result, Err(RadarLinkError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StaticConfig::default();
        config.device.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = StaticConfig::default();
        config.forwarder.target_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());
    }
}
