//! # Rebalancer Configuration
//!
//! Settings injected into the core by the caller. The core treats these as
//! opaque knobs: it never reads them from the environment itself, and the
//! JSON loader exists for the supervising process that owns configuration
//! files. Every field carries a serde default so partial files stay valid.

use crate::errors::RebalancerError;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RebalancerConfig {
    /// Minimum price deviation (percent, in price space) past a breached
    /// boundary before a rebalance is triggered.
    #[serde(default = "default_rebalance_threshold_percent")]
    pub rebalance_threshold_percent: f64,
    /// Total price width (percent) of a freshly centered range.
    #[serde(default = "default_range_width_percent")]
    pub range_width_percent: f64,
    /// Haircut (percent) applied to expected withdrawal amounts to form
    /// minimum-output bounds.
    #[serde(default = "default_max_slippage_percent")]
    pub max_slippage_percent: f64,
}

fn default_rebalance_threshold_percent() -> f64 {
    2.0
}

fn default_range_width_percent() -> f64 {
    5.0
}

fn default_max_slippage_percent() -> f64 {
    1.0
}

impl Default for RebalancerConfig {
    fn default() -> Self {
        Self {
            rebalance_threshold_percent: default_rebalance_threshold_percent(),
            range_width_percent: default_range_width_percent(),
            max_slippage_percent: default_max_slippage_percent(),
        }
    }
}

impl RebalancerConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .wrap_err("config file failed validation")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RebalancerError> {
        if !self.rebalance_threshold_percent.is_finite() || self.rebalance_threshold_percent < 0.0 {
            return Err(RebalancerError::Config(format!(
                "rebalance_threshold_percent must be a non-negative number, got {}",
                self.rebalance_threshold_percent
            )));
        }
        if !self.range_width_percent.is_finite() || self.range_width_percent <= 0.0 {
            return Err(RebalancerError::Config(format!(
                "range_width_percent must be positive, got {}",
                self.range_width_percent
            )));
        }
        if !self.max_slippage_percent.is_finite()
            || self.max_slippage_percent < 0.0
            || self.max_slippage_percent >= 100.0
        {
            return Err(RebalancerError::Config(format!(
                "max_slippage_percent must be in [0, 100), got {}",
                self.max_slippage_percent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RebalancerConfig::default();
        assert_eq!(config.rebalance_threshold_percent, 2.0);
        assert_eq!(config.range_width_percent, 5.0);
        assert_eq!(config.max_slippage_percent, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RebalancerConfig =
            serde_json::from_str(r#"{"range_width_percent": 10.0}"#).unwrap();
        assert_eq!(config.range_width_percent, 10.0);
        assert_eq!(config.rebalance_threshold_percent, 2.0);
        assert_eq!(config.max_slippage_percent, 1.0);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = RebalancerConfig::default();
        config.range_width_percent = 0.0;
        assert!(config.validate().is_err());

        let mut config = RebalancerConfig::default();
        config.max_slippage_percent = 100.0;
        assert!(config.validate().is_err());

        let mut config = RebalancerConfig::default();
        config.rebalance_threshold_percent = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rebalance_threshold_percent": 1.5, "range_width_percent": 8.0, "max_slippage_percent": 0.5}}"#
        )
        .unwrap();
        let config = RebalancerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.rebalance_threshold_percent, 1.5);
        assert_eq!(config.range_width_percent, 8.0);
        assert_eq!(config.max_slippage_percent, 0.5);
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"range_width_percent": -4.0}}"#).unwrap();
        assert!(RebalancerConfig::load_from_file(file.path()).is_err());
    }
}
