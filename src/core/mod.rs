//! Data logic behind the three views: column resolution, funding parsing,
//! filtering, profiles and dashboard aggregates

pub mod columns;
pub mod filters;
pub mod funding;
pub mod insights;
pub mod normalize;
pub mod profile;

pub use columns::{ColumnMapping, ColumnRole, Page};
pub use filters::{FilterSet, FundingFilter};
pub use funding::{derive_funding, format_funding, parse_funding};
pub use insights::Insights;
pub use normalize::{clean_key, normalize_sheet};
pub use profile::{build_profile, StartupProfile};
