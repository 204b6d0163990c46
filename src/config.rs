//! Type-safe connection settings for the monochromator.
//!
//! This module provides a strongly-typed settings struct that replaces
//! ad-hoc parsing of port/baud/timeout values at the connection site.
//! Benefits include:
//!
//! - Compile-time type safety
//! - Centralized validation logic
//! - Self-documenting configuration requirements
//! - Better error messages

use crate::error::{MonoError, MonoResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reserved port name that selects simulation mode without touching any
/// hardware.
pub const SIMULATION_PORT: &str = "Simulation";

/// Baud rates the instrument firmware can be configured for.
pub const SUPPORTED_BAUD_RATES: [u32; 4] = [9_600, 57_600, 115_200, 230_400];

/// Settings for one serial connection to the monochromator.
///
/// # Examples
///
/// ```toml
/// [instruments.monochromator]
/// port = "/dev/ttyUSB0"
/// baud_rate = 115200
/// timeout = "3s"
/// settle_delay = "2s"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Serial port path (e.g. "/dev/ttyUSB0", "COM4"), or [`SIMULATION_PORT`].
    pub port: String,
    /// Baud rate; must match the instrument setting.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// How long to wait for a reply before giving up (must be > 0).
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    /// Wait after opening a physical port, giving the controller time to run
    /// its boot/setup loop. Not applied in simulation mode.
    #[serde(with = "humantime_serde", default = "default_settle_delay")]
    pub settle_delay: Duration,
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_settle_delay() -> Duration {
    Duration::from_secs(2)
}

impl ConnectionSettings {
    /// Creates settings for the given port with default baud rate, timeout,
    /// and settle delay.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: default_baud_rate(),
            timeout: default_timeout(),
            settle_delay: default_settle_delay(),
        }
    }

    /// Creates settings from a TOML value.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the TOML structure doesn't match the expected fields
    /// or field types are incorrect.
    pub fn from_toml(config: &toml::Value) -> MonoResult<Self> {
        let text = toml::to_string(config)
            .map_err(|e| MonoError::Config(format!("Could not re-serialize settings: {e}")))?;
        toml::from_str(&text)
            .map_err(|e| MonoError::Config(format!("Could not parse connection settings: {e}")))
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `port` is empty
    /// - `baud_rate` is not one of [`SUPPORTED_BAUD_RATES`]
    /// - `timeout` is zero
    pub fn validate(&self) -> MonoResult<()> {
        if self.port.is_empty() {
            return Err(MonoError::Config("port must not be empty".to_string()));
        }
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(MonoError::Config(format!(
                "baud_rate {} is unsupported; expected one of {:?}",
                self.baud_rate, SUPPORTED_BAUD_RATES
            )));
        }
        if self.timeout.is_zero() {
            return Err(MonoError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Creates validated settings from TOML.
    ///
    /// Combines [`Self::from_toml`] and [`Self::validate`] in one call.
    pub fn from_toml_validated(config: &toml::Value) -> MonoResult<Self> {
        let settings = Self::from_toml(config)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Whether these settings select the simulation sentinel port.
    pub fn is_simulation(&self) -> bool {
        self.port == SIMULATION_PORT
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::new(SIMULATION_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = ConnectionSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.is_simulation());
    }

    #[test]
    fn test_validation_rejects_unsupported_baud_rate() {
        let mut settings = ConnectionSettings::new("/dev/ttyUSB0");
        settings.baud_rate = 4_800;
        assert!(matches!(settings.validate(), Err(MonoError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut settings = ConnectionSettings::new("/dev/ttyUSB0");
        settings.timeout = Duration::ZERO;
        assert!(matches!(settings.validate(), Err(MonoError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_empty_port() {
        let settings = ConnectionSettings::new("");
        assert!(matches!(settings.validate(), Err(MonoError::Config(_))));
    }

    #[test]
    fn test_from_toml() {
        let toml_str = r#"
            port = "COM4"
            baud_rate = 57600
            timeout = "50ms"
        "#;
        let value: toml::Value = toml::from_str(toml_str).unwrap();
        let settings = ConnectionSettings::from_toml_validated(&value).unwrap();

        assert_eq!(settings.port, "COM4");
        assert_eq!(settings.baud_rate, 57_600);
        assert_eq!(settings.timeout, Duration::from_millis(50));
        // settle_delay falls back to its default
        assert_eq!(settings.settle_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_from_toml_rejects_bad_baud() {
        let toml_str = r#"
            port = "COM4"
            baud_rate = 1200
        "#;
        let value: toml::Value = toml::from_str(toml_str).unwrap();
        assert!(ConnectionSettings::from_toml_validated(&value).is_err());
    }
}
