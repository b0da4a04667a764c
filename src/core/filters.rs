//! Row filtering for the list view (AND across independently selected filters)

use crate::core::columns::{ColumnMapping, ColumnRole};
use crate::types::NormalizedTable;
use std::collections::BTreeSet;
use tracing::debug;

/// Funding filter over the derived funding column
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FundingFilter {
    #[default]
    Any,
    /// Only rows without a disclosed amount
    UnfundedOnly,
    /// Inclusive amount range
    Range {
        min: f64,
        max: f64,
        include_unfunded: bool,
    },
}

impl FundingFilter {
    pub fn matches(&self, value: Option<f64>) -> bool {
        match (self, value) {
            (FundingFilter::Any, _) => true,
            (FundingFilter::UnfundedOnly, v) => v.is_none(),
            (
                FundingFilter::Range {
                    include_unfunded, ..
                },
                None,
            ) => *include_unfunded,
            (FundingFilter::Range { min, max, .. }, Some(v)) => v >= *min && v <= *max,
        }
    }
}

/// User-selected filters; empty selections are inactive
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub sectors: Vec<String>,
    pub cities: Vec<String>,
    pub tiers: Vec<String>,
    pub hot: Vec<String>,
    pub keyword: Option<String>,
    pub funding: FundingFilter,
}

impl FilterSet {
    fn memberships(&self) -> [(ColumnRole, &[String]); 4] {
        [
            (ColumnRole::Sector, self.sectors.as_slice()),
            (ColumnRole::City, self.cities.as_slice()),
            (ColumnRole::Tier, self.tiers.as_slice()),
            (ColumnRole::Hot, self.hot.as_slice()),
        ]
    }

    /// Indices of the rows passing every active filter.
    ///
    /// Filters whose column is unresolved are skipped.
    pub fn apply(
        &self,
        table: &NormalizedTable,
        mapping: &ColumnMapping,
        funding: &[Option<f64>],
    ) -> Vec<usize> {
        let mut sets: Vec<(&str, BTreeSet<&str>)> = Vec::new();
        for (role, selected) in self.memberships() {
            if selected.is_empty() {
                continue;
            }
            match mapping.get(role) {
                Some(key) => sets.push((key, selected.iter().map(String::as_str).collect())),
                None => debug!(role = %role, "skipping filter on unresolved column"),
            }
        }

        let keyword = self
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .and_then(|k| match mapping.get(ColumnRole::Keywords) {
                Some(key) => Some((key, k.to_lowercase())),
                None => {
                    debug!("skipping keyword search on unresolved column");
                    None
                }
            });

        (0..table.row_count())
            .filter(|&row| {
                sets.iter().all(|(key, allowed)| {
                    table
                        .text(row, key)
                        .is_some_and(|v| allowed.contains(v.as_str()))
                })
            })
            .filter(|&row| match &keyword {
                Some((key, needle)) => table
                    .text(row, key)
                    .is_some_and(|v| v.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .filter(|&row| self.funding.matches(funding.get(row).copied().flatten()))
            .collect()
    }
}

/// Sorted distinct non-null values of a column
pub fn distinct_values(table: &NormalizedTable, key: &str) -> Vec<String> {
    (0..table.row_count())
        .filter_map(|row| table.text(row, key))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
