//! Mission settings file
//!
//! A TOML file describing the configuration for the next mission. Every key
//! is optional; missing keys leave the register untouched.
//!
//! ```toml
//! sample_rate = 10
//! high_speed = false
//! high_resolution = true
//! rollover = false
//! start_upon_alarm = false
//! start_delay = 0
//! clock_enabled = true
//! logging_enabled = true
//!
//! [alarm]
//! low_enabled = true
//! low_threshold = -5.0
//! high_enabled = true
//! high_threshold = 30.5
//! ```

use std::fs;
use std::path::Path;

use super::StatusRegister;

/// Errors loading or applying a settings file
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The file could not be read
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML or has keys of the wrong type
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    /// A setting is out of range
    #[error("invalid setting: {0}")]
    Invalid(#[from] crate::Error),
}

/// Temperature alarm settings
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlarmSettings {
    /// Enable the low temperature alarm
    pub low_enabled: Option<bool>,
    /// Low alarm threshold in °C
    pub low_threshold: Option<f64>,
    /// Enable the high temperature alarm
    pub high_enabled: Option<bool>,
    /// High alarm threshold in °C
    pub high_threshold: Option<f64>,
}

/// Configuration for the next mission
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissionSettings {
    /// Sample rate in seconds (high speed) or minutes
    pub sample_rate: Option<u16>,
    /// Count the sample rate in seconds
    pub high_speed: Option<bool>,
    /// Log 16-bit samples
    pub high_resolution: Option<bool>,
    /// Overwrite the oldest samples when the log is full
    pub rollover: Option<bool>,
    /// Wait for a temperature alarm before logging
    pub start_upon_alarm: Option<bool>,
    /// Minutes between mission start and first sample
    pub start_delay: Option<u32>,
    /// Run the clock oscillator
    pub clock_enabled: Option<bool>,
    /// Enable temperature logging
    pub logging_enabled: Option<bool>,
    /// Temperature alarms
    #[serde(default)]
    pub alarm: AlarmSettings,
}

impl MissionSettings {
    /// Load settings from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Write the settings into a register image
    ///
    /// Thresholds are converted with the offset of the device type in the
    /// image, so the image must come from the target device. Nothing is
    /// changed if a value is rejected.
    pub fn apply(&self, registers: &mut StatusRegister) -> Result<(), SettingsError> {
        let mut updated = registers.clone();

        if let Some(rate) = self.sample_rate {
            updated.set_sample_rate(rate)?;
        }
        if let Some(high_speed) = self.high_speed {
            updated.set_high_speed(high_speed);
        }
        if let Some(high_resolution) = self.high_resolution {
            updated.set_high_resolution(high_resolution);
        }
        if let Some(rollover) = self.rollover {
            updated.set_rollover(rollover);
        }
        if let Some(start_upon_alarm) = self.start_upon_alarm {
            updated.set_start_upon_alarm(start_upon_alarm);
        }
        if let Some(delay) = self.start_delay {
            updated.set_mission_start_delay(delay);
        }
        if let Some(enabled) = self.clock_enabled {
            updated.set_clock_enabled(enabled);
        }
        if let Some(enabled) = self.logging_enabled {
            updated.set_logging_enabled(enabled);
        }

        let low = self
            .alarm
            .low_enabled
            .unwrap_or_else(|| updated.alarm_low_enabled());
        let high = self
            .alarm
            .high_enabled
            .unwrap_or_else(|| updated.alarm_high_enabled());
        updated.set_alarm_enabled(low, high);
        if let Some(threshold) = self.alarm.low_threshold {
            updated.set_alarm_low_threshold(threshold);
        }
        if let Some(threshold) = self.alarm.high_threshold {
            updated.set_alarm_high_threshold(threshold);
        }

        *registers = updated;
        Ok(())
    }
}
