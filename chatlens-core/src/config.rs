//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/chatlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/chatlens/` (~/.config/chatlens/)
//! - Data: `$XDG_DATA_HOME/chatlens/` (~/.local/share/chatlens/)
//! - State/Logs: `$XDG_STATE_HOME/chatlens/` (~/.local/state/chatlens/)

use crate::error::{Error, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Aggregation settings
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Where processed archives live
    #[serde(default)]
    pub data: DataConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upper bound on bounded bins per length histogram.
pub const MAX_HISTOGRAM_BINS: u64 = 10_000;

/// Settings consumed by the aggregation views.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Red packet amounts strictly above this are left out of payment totals
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,

    /// Width of each length histogram bin
    #[serde(default = "default_histogram_bin_width")]
    pub histogram_bin_width: u64,

    /// Values at or above this land in the overflow bin
    #[serde(default = "default_histogram_cap")]
    pub histogram_cap: u64,

    /// Display window for ranking views
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Offset applied to epoch timestamps before they are treated as local time
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            outlier_threshold: default_outlier_threshold(),
            histogram_bin_width: default_histogram_bin_width(),
            histogram_cap: default_histogram_cap(),
            top_n: default_top_n(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl AnalyticsConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !self.outlier_threshold.is_finite() || self.outlier_threshold < 0.0 {
            return Err(Error::Config(
                "analytics.outlier_threshold must be a non-negative number".to_string(),
            ));
        }
        if self.histogram_bin_width == 0 {
            return Err(Error::Config(
                "analytics.histogram_bin_width must be greater than 0".to_string(),
            ));
        }
        if self.histogram_cap == 0 {
            return Err(Error::Config(
                "analytics.histogram_cap must be greater than 0".to_string(),
            ));
        }
        let bins = self.histogram_cap.div_ceil(self.histogram_bin_width);
        if bins > MAX_HISTOGRAM_BINS {
            return Err(Error::Config(format!(
                "analytics.histogram_cap / histogram_bin_width gives {} bins (at most {})",
                bins, MAX_HISTOGRAM_BINS
            )));
        }
        if self.top_n == 0 {
            return Err(Error::Config(
                "analytics.top_n must be greater than 0".to_string(),
            ));
        }
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(Error::Config(
                "analytics.utc_offset_hours must be between -23 and 23".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured offset as a chrono timezone.
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            Error::Config(format!(
                "invalid utc offset: {} hours",
                self.utc_offset_hours
            ))
        })
    }

    /// Returns true when an amount passes the outlier policy.
    pub fn is_counted_amount(&self, amount: f64) -> bool {
        amount <= self.outlier_threshold
    }
}

fn default_outlier_threshold() -> f64 {
    50.0
}

fn default_histogram_bin_width() -> u64 {
    10
}

fn default_histogram_cap() -> u64 {
    300
}

fn default_top_n() -> usize {
    20
}

fn default_utc_offset_hours() -> i32 {
    8
}

/// Location of processed NDJSON archives
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DataConfig {
    /// Override for the data directory
    pub dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Mirror log events to stderr
    #[serde(default)]
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            stderr: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analytics.validate()?;
        Ok(config)
    }

    /// Directory the selection manager reads archives from.
    pub fn data_dir(&self) -> PathBuf {
        self.data
            .dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/chatlens/config.toml` (~/.config/chatlens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("chatlens").join("config.toml")
    }

    /// Returns the default archive directory
    ///
    /// `$XDG_DATA_HOME/chatlens/processed/` (~/.local/share/chatlens/processed/)
    pub fn default_data_dir() -> PathBuf {
        xdg_data_home().join("chatlens").join("processed")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/chatlens/` (~/.local/state/chatlens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("chatlens")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.outlier_threshold, 50.0);
        assert_eq!(config.analytics.histogram_bin_width, 10);
        assert_eq!(config.analytics.histogram_cap, 300);
        assert_eq!(config.analytics.top_n, 20);
        assert_eq!(config.logging.level, "info");
        assert!(config.analytics.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analytics]
outlier_threshold = 100.0
histogram_bin_width = 5
top_n = 10

[data]
dir = "/srv/archives"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.analytics.outlier_threshold, 100.0);
        assert_eq!(config.analytics.histogram_bin_width, 5);
        assert_eq!(config.analytics.histogram_cap, 300);
        assert_eq!(config.analytics.top_n, 10);
        assert_eq!(config.data_dir(), PathBuf::from("/srv/archives"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_analytics_validation() {
        let bad_width = AnalyticsConfig {
            histogram_bin_width: 0,
            ..Default::default()
        };
        assert!(bad_width.validate().is_err());

        let bad_threshold = AnalyticsConfig {
            outlier_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(bad_threshold.validate().is_err());

        let bad_offset = AnalyticsConfig {
            utc_offset_hours: 30,
            ..Default::default()
        };
        assert!(bad_offset.validate().is_err());
    }

    #[test]
    fn test_histogram_bin_count_is_bounded() {
        let huge = AnalyticsConfig {
            histogram_cap: 1_000_000_000_000,
            histogram_bin_width: 1,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(Error::Config(_))));

        let at_limit = AnalyticsConfig {
            histogram_cap: MAX_HISTOGRAM_BINS,
            histogram_bin_width: 1,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let wide = AnalyticsConfig {
            histogram_cap: 1_000_000_000_000,
            histogram_bin_width: 1_000_000_000,
            ..Default::default()
        };
        assert!(wide.validate().is_ok());
    }

    #[test]
    fn test_outlier_boundary() {
        let config = AnalyticsConfig::default();
        assert!(config.is_counted_amount(50.0));
        assert!(!config.is_counted_amount(50.01));
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\ntop_n = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
