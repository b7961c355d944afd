//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SAMPLE_RATE, MAX_VOLUME, MAX_VOLUME_TRIANGLE};
use crate::{ChiptoneError, Result};

/// Lowest accepted sample rate in Hz
pub const MIN_SAMPLE_RATE: u32 = 1_000;

/// Highest accepted sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Configuration of an [`Apu`](crate::Apu)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApuConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Full-scale level of the pulse and noise voices
    pub max_volume: i16,

    /// Full-scale level of the triangle voice
    pub max_volume_triangle: i16,
}

impl ApuConfig {
    /// Default levels at the given sample rate
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        ApuConfig {
            sample_rate,
            ..Default::default()
        }
    }

    /// 48 kHz output, the usual rate of desktop audio devices
    pub fn desktop() -> Self {
        Self::with_sample_rate(48_000)
    }

    /// 22.05 kHz output for cheap previews
    pub fn low_fidelity() -> Self {
        Self::with_sample_rate(22_050)
    }

    /// Override both full-scale levels
    pub fn volumes(mut self, max_volume: i16, max_volume_triangle: i16) -> Self {
        self.max_volume = max_volume;
        self.max_volume_triangle = max_volume_triangle;
        self
    }

    /// Full-scale level for the voice at `channel`
    #[inline]
    pub fn max_volume_for(&self, channel: usize) -> i16 {
        if channel == 2 {
            self.max_volume_triangle
        } else {
            self.max_volume
        }
    }

    /// Check that the sample rate and levels are usable
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ChiptoneError::ConfigError(format!(
                "sample rate {} Hz outside {}..={} Hz",
                self.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }
        if self.max_volume < 1 {
            return Err(ChiptoneError::ConfigError(format!(
                "max_volume must be positive, got {}",
                self.max_volume
            )));
        }
        if self.max_volume_triangle < 1 {
            return Err(ChiptoneError::ConfigError(format!(
                "max_volume_triangle must be positive, got {}",
                self.max_volume_triangle
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ApuConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json).map_err(|e| match e {
            ChiptoneError::Json(err) => {
                ChiptoneError::ConfigError(format!("{}: {}", path.display(), err))
            }
            other => other,
        })
    }
}

impl Default for ApuConfig {
    fn default() -> Self {
        ApuConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_volume: MAX_VOLUME,
            max_volume_triangle: MAX_VOLUME_TRIANGLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApuConfig::default();
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.max_volume, 0x1333);
        assert_eq!(config.max_volume_triangle, 0x2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(ApuConfig::desktop().sample_rate, 48_000);
        assert_eq!(ApuConfig::low_fidelity().sample_rate, 22_050);
        assert_eq!(ApuConfig::desktop().max_volume, MAX_VOLUME);
    }

    #[test]
    fn test_max_volume_by_role() {
        let config = ApuConfig::default().volumes(1000, 2000);
        assert_eq!(config.max_volume_for(0), 1000);
        assert_eq!(config.max_volume_for(1), 1000);
        assert_eq!(config.max_volume_for(2), 2000);
        assert_eq!(config.max_volume_for(3), 1000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ApuConfig::with_sample_rate(0).validate().is_err());
        assert!(ApuConfig::with_sample_rate(500_000).validate().is_err());
        assert!(ApuConfig::default().volumes(0, 100).validate().is_err());
        assert!(ApuConfig::default().volumes(100, -1).validate().is_err());
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = ApuConfig::from_json_str(r#"{ "sample_rate": 48000 }"#).unwrap();
        assert_eq!(config, ApuConfig::desktop());
    }

    #[test]
    fn test_json_invalid_rate() {
        let err = ApuConfig::from_json_str(r#"{ "sample_rate": 10 }"#).unwrap_err();
        assert!(matches!(err, ChiptoneError::ConfigError(_)));
    }

    #[test]
    fn test_json_malformed() {
        let err = ApuConfig::from_json_str("{ sample_rate").unwrap_err();
        assert!(matches!(err, ChiptoneError::Json(_)));
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apu.json");
        std::fs::write(&path, r#"{ "max_volume": 4096 }"#).unwrap();
        let config = ApuConfig::from_json_file(&path).unwrap();
        assert_eq!(config.max_volume, 4096);
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
    }
}
