//! Per-company profile view data

use crate::core::columns::{ColumnMapping, ColumnRole};
use crate::core::filters::distinct_values;
use crate::core::funding::format_funding;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::NormalizedTable;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartupProfile {
    pub company: String,
    pub sector: Option<String>,
    pub city: Option<String>,
    pub funding_stage: Option<String>,
    pub hot: Option<String>,
    pub funding: Option<f64>,
    pub funding_display: String,
    pub founders: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

/// Sorted distinct company names
pub fn company_names(table: &NormalizedTable, mapping: &ColumnMapping) -> Vec<String> {
    mapping
        .get(ColumnRole::Company)
        .map(|key| distinct_values(table, key))
        .unwrap_or_default()
}

/// The requested company when listed, otherwise the first in sorted order
pub fn select_company<'a>(names: &'a [String], requested: Option<&str>) -> Option<&'a str> {
    requested
        .and_then(|r| names.iter().find(|n| n.as_str() == r))
        .or_else(|| names.first())
        .map(String::as_str)
}

/// Build the profile from the first row whose company cell equals `company`
pub fn build_profile(
    table: &NormalizedTable,
    mapping: &ColumnMapping,
    funding: &[Option<f64>],
    company: &str,
) -> AnalyticsResult<StartupProfile> {
    let company_key = mapping
        .get(ColumnRole::Company)
        .ok_or_else(|| AnalyticsError::CompanyNotFound(company.to_string()))?;

    let row = (0..table.row_count())
        .find(|&row| table.text(row, company_key).as_deref() == Some(company))
        .ok_or_else(|| AnalyticsError::CompanyNotFound(company.to_string()))?;

    let field = |role: ColumnRole| mapping.get(role).and_then(|key| table.text(row, key));
    let amount = funding.get(row).copied().flatten();

    Ok(StartupProfile {
        company: company.to_string(),
        sector: field(ColumnRole::Sector),
        city: field(ColumnRole::City),
        funding_stage: field(ColumnRole::FundingLevel),
        hot: field(ColumnRole::Hot),
        funding: amount,
        funding_display: format_funding(amount),
        founders: field(ColumnRole::Founder),
        email: field(ColumnRole::Email),
        phone: field(ColumnRole::Phone),
        description: field(ColumnRole::Description),
    })
}
