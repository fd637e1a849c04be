//! Configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vlp2410_hw::{ControlStrings, Parity, PortSettings, StopBits};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Serial port configuration
    #[serde(default)]
    pub port: PortConfig,

    /// Framing configuration
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

/// Serial port configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    /// Serial device path (e.g., "/dev/ttyUSB0" or "COM3")
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_data_bits")]
    pub data_bits: u8,

    /// none, odd, even, mark or space
    #[serde(default = "default_parity")]
    pub parity: String,

    /// one, one-point-five or two
    #[serde(default = "default_stop_bits")]
    pub stop_bits: String,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            parity: default_parity(),
            stop_bits: default_stop_bits(),
        }
    }
}

/// Frame control string configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Header marker
    #[serde(default = "default_start")]
    pub start: String,

    /// Frame delimiter
    #[serde(default = "default_end")]
    pub end: String,

    /// Pause after each frame in milliseconds (minimum 10)
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            settle_ms: default_settle(),
        }
    }
}

// Default value functions
fn default_device() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    vlp2410_hw::DEFAULT_BAUD_RATE
}

fn default_data_bits() -> u8 {
    vlp2410_hw::DEFAULT_DATA_BITS
}

fn default_parity() -> String {
    Parity::default().to_string()
}

fn default_stop_bits() -> String {
    StopBits::default().to_string()
}

fn default_start() -> String {
    vlp2410_hw::protocol::DEFAULT_START.to_string()
}

fn default_end() -> String {
    vlp2410_hw::protocol::DEFAULT_END.to_string()
}

fn default_settle() -> u64 {
    vlp2410_hw::SETTLE_DELAY.as_millis() as u64
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
        Ok(())
    }

    /// Converts the port section into library settings.
    pub fn port_settings(&self) -> Result<PortSettings> {
        let parity: Parity = self
            .port
            .parity
            .parse()
            .context("Invalid parity in configuration")?;
        let stop_bits: StopBits = self
            .port
            .stop_bits
            .parse()
            .context("Invalid stop bits in configuration")?;

        Ok(PortSettings::new(&self.port.device)
            .baud_rate(self.port.baud_rate)
            .data_bits(self.port.data_bits)
            .parity(parity)
            .stop_bits(stop_bits))
    }

    pub fn control_strings(&self) -> ControlStrings {
        ControlStrings::new(&self.protocol.start, &self.protocol.end)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.protocol.settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        let settings = config.port_settings().unwrap();
        assert_eq!(settings, PortSettings::new("/dev/ttyUSB0"));
        assert_eq!(config.control_strings(), ControlStrings::default());
        assert_eq!(config.settle_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_parse() {
        let config: Config = toml::from_str(
            r#"
            [port]
            device = "COM3"
            baud_rate = 9600
            parity = "even"
            stop_bits = "two"

            [protocol]
            end = "\r"
            settle_ms = 25
            "#,
        )
        .unwrap();

        let settings = config.port_settings().unwrap();
        assert_eq!(settings.port_name, "COM3");
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.data_bits, 8);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.stop_bits, StopBits::Two);
        assert_eq!(config.control_strings(), ControlStrings::new("@", "\r"));
        assert_eq!(config.settle_delay(), Duration::from_millis(25));
    }

    #[test]
    fn test_bundled_default_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(
            config.port_settings().unwrap(),
            PortSettings::new("/dev/ttyUSB0")
        );
        assert_eq!(config.control_strings(), ControlStrings::default());
    }

    #[test]
    fn test_invalid_parity() {
        let config: Config = toml::from_str("[port]\nparity = \"sometimes\"\n").unwrap();
        assert!(config.port_settings().is_err());
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir().join(format!("vlp2410-config-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.port.device = "/dev/ttyS1".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.port.device, "/dev/ttyS1");
        assert_eq!(loaded.protocol.end, "\r\n");
    }
}
