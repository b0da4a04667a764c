//! Startup Analytics - cached loader and analytics over a startup spreadsheet
//!
//! Reads a spreadsheet whose header row sits somewhere below a preamble,
//! normalizes it into a typed table and keeps a Parquet copy so later loads
//! skip the slow path.
//!
//! # Features
//!
//! - Header row detection (first row containing a `Company` cell)
//! - Column key normalization and empty-sentinel handling
//! - Parquet cache with staleness and expiry checks
//! - Keyword-based column resolution, funding parsing, filters and aggregates
//!
//! # Example
//!
//! ```no_run
//! use startup_analytics::cache::CacheManager;
//! use startup_analytics::config::AnalyticsConfig;
//! use startup_analytics::core::{ColumnMapping, Page};
//!
//! let manager = CacheManager::new(AnalyticsConfig::default());
//! let load = manager.load()?;
//!
//! let mapping = ColumnMapping::for_page(&load.table, Page::List);
//! println!("Rows: {}", load.table.row_count());
//! println!("Unresolved: {:?}", mapping.missing());
//! # Ok::<(), startup_analytics::error::AnalyticsError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod types;

// Re-export commonly used types
pub use error::{AnalyticsError, AnalyticsResult};
pub use types::{Column, ColumnKind, ColumnValues, NormalizedTable};
