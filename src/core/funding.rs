//! Funding amount parser and the derived per-row funding column

use crate::types::NormalizedTable;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9.]+").expect("funding number pattern is valid"));

const CRORE: f64 = 10_000_000.0;
const MILLION: f64 = 1_000_000.0;
const THOUSAND: f64 = 1_000.0;

/// Parse free-text funding into absolute currency units.
///
/// Takes the first run of digits and dots, then scales by the first unit
/// marker found: `cr` (crore), `m` (million), `k` (thousand). Any `m` or `k`
/// anywhere in the text counts; that is a known limitation of the heuristic.
/// Empty input and text without digits give `None`.
pub fn parse_funding(raw: &str) -> Option<f64> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let value: f64 = NUMBER_RUN.find(&text)?.as_str().parse().ok()?;

    let multiplier = if text.contains("cr") {
        CRORE
    } else if text.contains('m') {
        MILLION
    } else if text.contains('k') {
        THOUSAND
    } else {
        1.0
    };

    Some(value * multiplier)
}

/// Derive one funding value per row from the funding column.
///
/// Recomputed on every view; never written to the cache. An unresolved
/// column yields an all-absent vector.
pub fn derive_funding(table: &NormalizedTable, column: Option<&str>) -> Vec<Option<f64>> {
    let Some(key) = column else {
        return vec![None; table.row_count()];
    };
    (0..table.row_count())
        .map(|row| {
            table
                .cell(row, key)
                .and_then(|cell| parse_funding(&cell.to_string()))
        })
        .collect()
}

/// Minimum and maximum of the disclosed amounts
pub fn funding_bounds(values: &[Option<f64>]) -> Option<(f64, f64)> {
    values.iter().flatten().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Profile display: `$ 2.50M` or `Not disclosed`
pub fn format_funding(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("$ {:.2}M", v / MILLION),
        None => "Not disclosed".to_string(),
    }
}
