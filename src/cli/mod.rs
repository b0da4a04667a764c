//! CLI command handlers

pub mod commands;

pub use commands::{
    cache_clear, cache_rebuild, cache_status, insights, list, profile, FundingArgs,
    GlobalOptions, ListArgs,
};
