//! Configuration types

use crate::{ConfigError, WellplatedResult, CODE_LENGTH, HEADER_LENGTH};
use serde::{Deserialize, Serialize};

/// Runtime settings for container minting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellplatedConfig {
    /// Most containers one `allocate` call may reserve.
    pub max_batch_size: u64,
    /// First internal sequence number handed out for a new format.
    pub first_sequence: u64,
    /// Seed the untracked start/end formats, containers, and positions.
    pub seed_untracked: bool,
}

impl Default for WellplatedConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10_000,
            // Matches database autoincrement, which never hands out 0.
            first_sequence: 1,
            seed_untracked: true,
        }
    }
}

impl WellplatedConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `WELLPLATED_MAX_BATCH_SIZE`: Containers per allocation (default: 10000)
    /// - `WELLPLATED_FIRST_SEQUENCE`: First internal sequence number (default: 1)
    /// - `WELLPLATED_SEED_UNTRACKED`: "true" or "false" (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_batch_size: std::env::var("WELLPLATED_MAX_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_batch_size),
            first_sequence: std::env::var("WELLPLATED_FIRST_SEQUENCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.first_sequence),
            seed_untracked: std::env::var("WELLPLATED_SEED_UNTRACKED")
                .ok()
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(defaults.seed_untracked),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - max_batch_size > 0
    /// - first_sequence fits the widest sequence field (empty prefix)
    pub fn validate(&self) -> WellplatedResult<()> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_batch_size".to_string(),
                value: self.max_batch_size.to_string(),
                reason: "max_batch_size must be greater than 0".to_string(),
            }
            .into());
        }

        let widest = 10u64.pow((CODE_LENGTH - HEADER_LENGTH) as u32) - 1;
        if self.first_sequence > widest {
            return Err(ConfigError::InvalidValue {
                field: "first_sequence".to_string(),
                value: self.first_sequence.to_string(),
                reason: format!("first_sequence must be at most {widest}"),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = WellplatedConfig::default();
        assert_eq!(config.max_batch_size, 10_000);
        assert_eq!(config.first_sequence, 1);
        assert!(config.seed_untracked);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = WellplatedConfig {
            max_batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_first_sequence_ceiling() {
        let config = WellplatedConfig {
            first_sequence: 999_999_999_999,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = WellplatedConfig {
            first_sequence: 1_000_000_000_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    // The only test in this crate that touches these variables.
    #[test]
    fn test_from_env_overrides_and_fallbacks() {
        std::env::set_var("WELLPLATED_MAX_BATCH_SIZE", "250");
        std::env::set_var("WELLPLATED_FIRST_SEQUENCE", "1000");
        std::env::set_var("WELLPLATED_SEED_UNTRACKED", "FALSE");
        let config = WellplatedConfig::from_env();
        assert_eq!(config.max_batch_size, 250);
        assert_eq!(config.first_sequence, 1000);
        assert!(!config.seed_untracked);

        std::env::set_var("WELLPLATED_MAX_BATCH_SIZE", "lots");
        std::env::set_var("WELLPLATED_FIRST_SEQUENCE", "-3");
        std::env::set_var("WELLPLATED_SEED_UNTRACKED", "yes");
        let config = WellplatedConfig::from_env();
        assert_eq!(config, WellplatedConfig::default());

        std::env::remove_var("WELLPLATED_MAX_BATCH_SIZE");
        std::env::remove_var("WELLPLATED_FIRST_SEQUENCE");
        std::env::remove_var("WELLPLATED_SEED_UNTRACKED");
        assert_eq!(WellplatedConfig::from_env(), WellplatedConfig::default());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = WellplatedConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: WellplatedConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
