use std::path::PathBuf;
use thiserror::Error;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// No row in the scanned range holds a `company` cell.
    #[error("Header row not found in {path} (scanned {scanned_rows} rows for a 'Company' cell)")]
    HeaderNotFound { path: PathBuf, scanned_rows: usize },

    /// Neither the cache artifact nor the source spreadsheet exists.
    #[error("Source file not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Cache artifact is corrupt: {0}")]
    CacheCorrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel error: {0}")]
    Excel(String),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),
}

impl From<serde_yaml::Error> for AnalyticsError {
    fn from(e: serde_yaml::Error) -> Self {
        AnalyticsError::Config(e.to_string())
    }
}

impl From<calamine::Error> for AnalyticsError {
    fn from(e: calamine::Error) -> Self {
        AnalyticsError::Excel(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AnalyticsError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AnalyticsError::Export(e.to_string())
    }
}

impl AnalyticsError {
    /// Loader-level failures that abort the current view.
    pub fn is_fatal_for_view(&self) -> bool {
        matches!(
            self,
            AnalyticsError::HeaderNotFound { .. } | AnalyticsError::SourceMissing(_)
        )
    }
}
