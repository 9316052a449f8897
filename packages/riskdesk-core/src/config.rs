//! Analysis parameters loaded from a TOML file.
//!
//! The analytics functions never read this; front ends load it and pass the values
//! through as explicit arguments.

use crate::{Error, Result, DEFAULT_ROLLING_WINDOW, TRADING_DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Parameters for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Trading days per year used for annualization
    pub trading_days_per_year: u32,
    /// Annual risk-free rate (e.g., 0.04 for 4%)
    pub risk_free_rate: f64,
    /// Trailing window for rolling statistics, in rows
    pub rolling_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            risk_free_rate: 0.0,
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

impl AnalysisConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.riskdesk/config.toml`
    /// Can be overridden with `RISKDESK_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("RISKDESK_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".riskdesk/config.toml"))
            .unwrap_or_else(|| PathBuf::from("riskdesk.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.trading_days_per_year == 0 {
            return Err(Error::InvalidConfig(
                "trading_days_per_year must be positive".to_string(),
            ));
        }
        if self.rolling_window == 0 {
            return Err(Error::InvalidConfig(
                "rolling_window must be positive".to_string(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidConfig(
                "risk_free_rate must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.trading_days_per_year, 252);
        assert_eq!(config.risk_free_rate, 0.0);
        assert_eq!(config.rolling_window, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml("risk_free_rate = 0.02\n").unwrap();
        assert_eq!(config.risk_free_rate, 0.02);
        assert_eq!(config.trading_days_per_year, 252);
        assert_eq!(config.rolling_window, 20);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AnalysisConfig::from_toml("rolling_window = 0"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_toml("trading_days_per_year = 0"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_toml("risk_free_rate = nan"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_toml("window = 5"),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        // missing file falls back to defaults
        assert_eq!(
            AnalysisConfig::load_from_path(&path).unwrap(),
            AnalysisConfig::default()
        );

        fs::write(&path, "trading_days_per_year = 365\nrolling_window = 30\n").unwrap();
        let config = AnalysisConfig::load_from_path(&path).unwrap();
        assert_eq!(config.trading_days_per_year, 365);
        assert_eq!(config.rolling_window, 30);
    }
}
