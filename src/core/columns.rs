//! Column resolver: semantic roles → literal column keys by keyword substring

use crate::types::NormalizedTable;
use serde::Serialize;
use std::fmt;

/// A semantic field a page wants to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Company,
    Sector,
    City,
    Tier,
    FundingLevel,
    Funding,
    Hot,
    Keywords,
    Description,
    Founder,
    Email,
    Phone,
    FoundingYear,
    FounderType,
}

impl ColumnRole {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::Company => "Company",
            ColumnRole::Sector => "Sector",
            ColumnRole::City => "City",
            ColumnRole::Tier => "Tier",
            ColumnRole::FundingLevel => "Funding Stage",
            ColumnRole::Funding => "Funding Received",
            ColumnRole::Hot => "Hot Startup",
            ColumnRole::Keywords => "Keywords",
            ColumnRole::Description => "Description",
            ColumnRole::Founder => "Founder",
            ColumnRole::Email => "Email",
            ColumnRole::Phone => "Phone",
            ColumnRole::FoundingYear => "Founding Year",
            ColumnRole::FounderType => "Founder Type",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A role with its keywords in priority order
#[derive(Debug, Clone, Copy)]
pub struct RoleSpec {
    pub role: ColumnRole,
    pub keywords: &'static [&'static str],
}

const fn spec(role: ColumnRole, keywords: &'static [&'static str]) -> RoleSpec {
    RoleSpec { role, keywords }
}

const LIST_ROLES: &[RoleSpec] = &[
    spec(ColumnRole::Company, &["company"]),
    spec(ColumnRole::Sector, &["sector", "industry"]),
    spec(ColumnRole::City, &["city"]),
    spec(ColumnRole::Tier, &["tier"]),
    spec(ColumnRole::FundingLevel, &["funding_level", "stage"]),
    spec(ColumnRole::Funding, &["funding_received", "amount"]),
    spec(ColumnRole::Hot, &["hot"]),
    spec(ColumnRole::Keywords, &["key"]),
];

const PROFILE_ROLES: &[RoleSpec] = &[
    spec(ColumnRole::Company, &["company"]),
    spec(ColumnRole::Sector, &["sector"]),
    spec(ColumnRole::City, &["city"]),
    spec(ColumnRole::FundingLevel, &["funding_level", "stage"]),
    spec(ColumnRole::Funding, &["funding_received"]),
    spec(ColumnRole::Hot, &["hot"]),
    spec(ColumnRole::Description, &["description"]),
    spec(ColumnRole::Founder, &["founder"]),
    spec(ColumnRole::Email, &["email"]),
    spec(ColumnRole::Phone, &["contact", "phone"]),
];

const INSIGHTS_ROLES: &[RoleSpec] = &[
    spec(ColumnRole::Sector, &["sector", "industry"]),
    spec(ColumnRole::City, &["city", "location"]),
    spec(ColumnRole::FoundingYear, &["founding_year", "founded", "year"]),
    spec(ColumnRole::FundingLevel, &["funding_level", "stage"]),
    spec(ColumnRole::FounderType, &["founder_type", "gender", "type"]),
];

/// The views that consume the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    List,
    Profile,
    Insights,
}

impl Page {
    pub fn roles(&self) -> &'static [RoleSpec] {
        match self {
            Page::List => LIST_ROLES,
            Page::Profile => PROFILE_ROLES,
            Page::Insights => INSIGHTS_ROLES,
        }
    }
}

/// First column (in table order) whose key contains any keyword.
///
/// For each column the keywords are tried in priority order.
pub fn resolve<'a, I>(columns: I, keywords: &[&str]) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    columns
        .into_iter()
        .find(|col| keywords.iter().any(|k| col.contains(k)))
}

/// Per-page role → column mapping; computed, never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMapping {
    entries: Vec<(ColumnRole, Option<String>)>,
}

impl ColumnMapping {
    pub fn resolve_roles(table: &NormalizedTable, specs: &[RoleSpec]) -> Self {
        let keys = table.column_keys();
        let entries = specs
            .iter()
            .map(|spec| {
                let column = resolve(keys.iter().copied(), spec.keywords).map(str::to_string);
                (spec.role, column)
            })
            .collect();
        Self { entries }
    }

    pub fn for_page(table: &NormalizedTable, page: Page) -> Self {
        Self::resolve_roles(table, page.roles())
    }

    /// Resolved column key for a role (absent when unresolved or not on this page)
    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .and_then(|(_, col)| col.as_deref())
    }

    /// Roles of this page without a matching column
    pub fn missing(&self) -> Vec<ColumnRole> {
        self.entries
            .iter()
            .filter(|(_, col)| col.is_none())
            .map(|(role, _)| *role)
            .collect()
    }

    pub fn entries(&self) -> &[(ColumnRole, Option<String>)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, ColumnValues};

    fn table_with(keys: &[&str]) -> NormalizedTable {
        NormalizedTable::from_columns(
            keys.iter()
                .map(|k| Column::new(*k, ColumnValues::Text(vec![])))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_scans_columns_before_keywords() {
        let cols = ["industry_type", "sector"];
        // The first column wins even though "sector" is the higher-priority keyword
        assert_eq!(resolve(cols, &["sector", "industry"]), Some("industry_type"));
    }

    #[test]
    fn test_resolve_substring_and_absent() {
        let cols = ["company_name", "funding_received_usd"];
        assert_eq!(resolve(cols, &["company"]), Some("company_name"));
        assert_eq!(
            resolve(cols, &["funding_received", "amount"]),
            Some("funding_received_usd")
        );
        assert_eq!(resolve(cols, &["city"]), None);
    }

    #[test]
    fn test_resolve_deterministic() {
        let cols = ["company", "key_people", "keywords", "hot_startup"];
        let first = resolve(cols, &["key"]);
        for _ in 0..10 {
            assert_eq!(resolve(cols, &["key"]), first);
        }
        assert_eq!(first, Some("key_people"));
    }

    #[test]
    fn test_mapping_for_page() {
        let table = table_with(&["company", "sector", "city", "funding_received"]);
        let mapping = ColumnMapping::for_page(&table, Page::List);

        assert_eq!(mapping.get(ColumnRole::Company), Some("company"));
        assert_eq!(mapping.get(ColumnRole::Funding), Some("funding_received"));
        assert_eq!(mapping.get(ColumnRole::Tier), None);
        assert_eq!(
            mapping.missing(),
            vec![
                ColumnRole::Tier,
                ColumnRole::FundingLevel,
                ColumnRole::Hot,
                ColumnRole::Keywords
            ]
        );
    }

    #[test]
    fn test_pages_use_different_keywords() {
        let table = table_with(&["company", "industry", "location", "amount"]);

        let list = ColumnMapping::for_page(&table, Page::List);
        assert_eq!(list.get(ColumnRole::Sector), Some("industry"));
        assert_eq!(list.get(ColumnRole::Funding), Some("amount"));
        assert_eq!(list.get(ColumnRole::City), None);

        let profile = ColumnMapping::for_page(&table, Page::Profile);
        assert_eq!(profile.get(ColumnRole::Sector), None);
        assert_eq!(profile.get(ColumnRole::Funding), None);

        let insights = ColumnMapping::for_page(&table, Page::Insights);
        assert_eq!(insights.get(ColumnRole::City), Some("location"));
        // Roles outside the page are never resolved
        assert_eq!(insights.get(ColumnRole::Company), None);
    }
}
