use crate::cache::{DEFAULT_DATA_CACHE_CAPACITY, DEFAULT_FEATURE_CACHE_CAPACITY};
use crate::error::{CompatError, Result};
use crate::types::RequiredLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Limits for file scanning operations
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024; // 5MB
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Directory names never descended into
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

/// Configuration for a scan, loadable from JSON or YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub required_level: RequiredLevel,
    /// Capacity of the resolver's whole-feature cache
    pub feature_cache_capacity: usize,
    /// Capacity of the dataset provider's raw lookup cache
    pub data_cache_capacity: usize,
    pub max_file_size: u64,
    pub file_timeout_secs: u64,
    /// Files handed to the worker pool per batch
    pub batch_size: usize,
    /// Check `@container`, `@layer` and other at-rules
    pub check_at_rules: bool,
    pub exclude_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            required_level: RequiredLevel::Low,
            feature_cache_capacity: DEFAULT_FEATURE_CACHE_CAPACITY,
            data_cache_capacity: DEFAULT_DATA_CACHE_CAPACITY,
            max_file_size: MAX_FILE_SIZE,
            file_timeout_secs: DEFAULT_TIMEOUT_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            check_at_rules: false,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration file. `.yaml`/`.yml` are read as YAML, anything
    /// else as JSON. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CompatError::path_not_found(path));
        }

        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let config: ScanConfig = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors for invalid settings
    pub fn validate(&self) -> Result<()> {
        if self.feature_cache_capacity == 0 {
            return Err(CompatError::validation("feature_cache_capacity", "must be greater than 0"));
        }
        if self.data_cache_capacity == 0 {
            return Err(CompatError::validation("data_cache_capacity", "must be greater than 0"));
        }
        if self.max_file_size == 0 {
            return Err(CompatError::validation("max_file_size", "must be greater than 0"));
        }
        if self.file_timeout_secs == 0 {
            return Err(CompatError::validation("file_timeout_secs", "must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(CompatError::validation("batch_size", "must be greater than 0"));
        }
        Ok(())
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }
}

pub mod validation {
    use crate::error::{CompatError, Result};

    /// Validate file size against limits
    pub fn validate_file_size(size: u64, limit: u64) -> Result<()> {
        if size > limit {
            return Err(CompatError::file_too_large(size, limit));
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
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.required_level, RequiredLevel::Low);
        assert_eq!(config.feature_cache_capacity, 1000);
        assert_eq!(config.data_cache_capacity, 5000);
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert!(!config.check_at_rules);
        assert!(config.is_excluded_dir("node_modules"));
        assert!(!config.is_excluded_dir("src"));
    }

    #[test]
    fn test_scan_config_validation() {
        let bad = ScanConfig {
            max_file_size: 0,
            ..ScanConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = ScanConfig {
            feature_cache_capacity: 0,
            ..ScanConfig::default()
        };
        match bad.validate() {
            Err(CompatError::Validation { field, .. }) => {
                assert_eq!(field, "feature_cache_capacity")
            }
            other => panic!("unexpected: {other:?}"),
        }

        let bad = ScanConfig {
            batch_size: 0,
            ..ScanConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = ScanConfig {
            file_timeout_secs: 0,
            ..ScanConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_file_size_validation() {
        assert!(validation::validate_file_size(10, 10).is_ok());
        assert!(matches!(
            validation::validate_file_size(11, 10),
            Err(CompatError::FileTooLarge {
                size: 11,
                limit: 10
            })
        ));
    }

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "required_level: high\ncheck_at_rules: true\nexclude_dirs: [vendor]"
        )
        .unwrap();

        let config = ScanConfig::from_file(file.path()).unwrap();
        assert_eq!(config.required_level, RequiredLevel::High);
        assert!(config.check_at_rules);
        assert_eq!(config.exclude_dirs, vec!["vendor".to_string()]);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"required_level": "high", "feature_cache_capacity": 10}}"#).unwrap();

        let config = ScanConfig::from_file(file.path()).unwrap();
        assert_eq!(config.required_level, RequiredLevel::High);
        assert_eq!(config.feature_cache_capacity, 10);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"batch_size": 0}}"#).unwrap();
        assert!(ScanConfig::from_file(file.path()).is_err());

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"unknown_field": true}}"#).unwrap();
        assert!(matches!(ScanConfig::from_file(file.path()), Err(CompatError::Json(_))));

        assert!(matches!(
            ScanConfig::from_file("/definitely/not/here.json"),
            Err(CompatError::PathNotFound { .. })
        ));
    }
}
