//! Configuration for the contrail warehouse loader.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the normalized source store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding one NDJSON file per period.
    pub path: String,
    /// Period table names, loaded strictly in this order.
    #[serde(default = "default_periods")]
    pub periods: Vec<String>,
}

fn default_periods() -> Vec<String> {
    ["Q1", "Q2", "Q3", "Q4"].map(String::from).to_vec()
}

/// Configuration for the warehouse target store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Directory the file-backed warehouse writes one NDJSON file per table to.
    pub path: String,
}

/// Quality-gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Minimum percentage of a period's records that must pass validation
    /// and dedup. Exactly at the boundary is accepted.
    #[serde(default = "default_min_clean_percent")]
    pub min_clean_percent: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_clean_percent: default_min_clean_percent(),
        }
    }
}

fn default_min_clean_percent() -> f64 {
    70.0
}

/// Bulk-load configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Rows per insert batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Attempts per batch before the load is declared fatal.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Emit a progress log line roughly every this many rows.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            progress_interval: default_progress_interval(),
        }
    }
}

fn default_batch_size() -> usize {
    25_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_progress_interval() -> usize {
    50_000
}

/// Main configuration for contrail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source configuration.
    pub source: SourceConfig,
    /// Warehouse configuration.
    pub warehouse: WarehouseConfig,
    /// Quality-gate configuration.
    #[serde(default)]
    pub quality: QualityConfig,
    /// Bulk-load configuration.
    #[serde(default)]
    pub load: LoadConfig,
    /// Carrier code to display name mapping. Codes absent from this map get
    /// a null carrier name in the dimension; that is not an error.
    #[serde(default = "default_carrier_names")]
    pub carriers: IndexMap<String, String>,
    /// Optional path for the per-stage run checkpoint file.
    #[serde(default)]
    pub checkpoint_path: Option<String>,
}

/// The 15 known carrier codes and their display names.
pub fn default_carrier_names() -> IndexMap<String, String> {
    [
        ("9E", "Endeavor Air"),
        ("AA", "American Airlines"),
        ("AS", "Alaska Airlines"),
        ("B6", "JetBlue Airways"),
        ("DL", "Delta Air Lines"),
        ("F9", "Frontier Airlines"),
        ("G4", "Allegiant Air"),
        ("HA", "Hawaiian Airlines"),
        ("MQ", "Envoy Air"),
        ("NK", "Spirit Airlines"),
        ("OH", "PSA Airlines"),
        ("OO", "SkyWest Airlines"),
        ("UA", "United Airlines"),
        ("WN", "Southwest Airlines"),
        ("YX", "Republic Airways"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|source| ConfigError::ReadFile { source })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml::from_str(contents).map_err(|source| ConfigError::YamlParse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.periods.is_empty() {
            return Err(ConfigError::NoPeriods);
        }
        if !(self.quality.min_clean_percent > 0.0 && self.quality.min_clean_percent <= 100.0) {
            return Err(ConfigError::InvalidCleanThreshold {
                value: self.quality.min_clean_percent,
            });
        }
        if self.load.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.load.max_attempts == 0 {
            return Err(ConfigError::InvalidRetryBudget);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_yaml_parsing() {
        let yaml = r#"
source:
  path: "/data/source"
  periods: [Q1, Q2]
warehouse:
  path: "/data/warehouse"
quality:
  min_clean_percent: 80.0
load:
  batch_size: 1000
  max_attempts: 5
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.source.periods, vec!["Q1", "Q2"]);
        assert_eq!(config.quality.min_clean_percent, 80.0);
        assert_eq!(config.load.batch_size, 1000);
        assert_eq!(config.load.max_attempts, 5);
        assert!(config.checkpoint_path.is_none());
    }

    #[test]
    fn test_config_defaults() {
        let yaml = r#"
source:
  path: "/data/source"
warehouse:
  path: "/data/warehouse"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.source.periods, vec!["Q1", "Q2", "Q3", "Q4"]);
        assert_eq!(config.quality.min_clean_percent, 70.0);
        assert_eq!(config.load.batch_size, 25_000);
        assert_eq!(config.load.max_attempts, 3);
        assert_eq!(config.carriers.len(), 15);
        assert_eq!(config.carriers.get("DL").unwrap(), "Delta Air Lines");
    }

    #[test]
    fn test_config_rejects_empty_periods() {
        let yaml = r#"
source:
  path: "/data/source"
  periods: []
warehouse:
  path: "/data/warehouse"
"#;
        assert!(matches!(Config::parse(yaml), Err(ConfigError::NoPeriods)));
    }

    #[test]
    fn test_config_rejects_bad_threshold() {
        let yaml = r#"
source:
  path: "/data/source"
warehouse:
  path: "/data/warehouse"
quality:
  min_clean_percent: 0.0
"#;
        assert!(matches!(
            Config::parse(yaml),
            Err(ConfigError::InvalidCleanThreshold { .. })
        ));
    }

    #[test]
    fn test_config_rejects_zero_batch_size() {
        let yaml = r#"
source:
  path: "/data/source"
warehouse:
  path: "/data/warehouse"
load:
  batch_size: 0
"#;
        assert!(matches!(
            Config::parse(yaml),
            Err(ConfigError::InvalidBatchSize)
        ));
    }
}
