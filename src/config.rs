//! Runtime configuration
//!
//! Defaults mirror the fixed paths of the data directory layout; a YAML file
//! and CLI flags (or `STARTUP_ANALYTICS_*` env vars) can override them.

use crate::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOURCE: &str = "data/startups.xlsx";
pub const DEFAULT_CACHE: &str = "data/startups.parquet";
pub const DEFAULT_TTL_SECS: u64 = 3600;
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Source spreadsheet
    pub source: PathBuf,
    /// Parquet cache artifact
    pub cache: PathBuf,
    /// Maximum artifact age in seconds; 0 disables the check
    pub ttl_secs: u64,
    /// Rows scanned for the header before giving up
    pub header_scan_rows: usize,
    /// Scan the rest of the sheet once the bounded scan is exhausted
    pub full_scan_fallback: bool,
    /// Worksheet name; first sheet when unset
    pub sheet: Option<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            cache: PathBuf::from(DEFAULT_CACHE),
            ttl_secs: DEFAULT_TTL_SECS,
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            full_scan_fallback: false,
            sheet: None,
        }
    }
}

impl AnalyticsConfig {
    /// Load from a YAML file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> AnalyticsResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyticsError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: AnalyticsConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.header_scan_rows == 0 {
            return Err(AnalyticsError::Config(
                "header_scan_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}
