//! Normalization stage: header text → canonical keys, cells → typed nullable values

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{Column, ColumnKind, ColumnValues, NormalizedTable, RawCell, RawSheet};
use std::collections::HashSet;

/// Cell tokens that mean "no value"
pub const EMPTY_SENTINELS: [&str; 5] = ["-", "\u{2014}", "None", "nan", "NaN"];

/// Clean a header into a column key.
///
/// trim → lowercase → whitespace to `_` → `-` to `_` → drop `(` and `)`.
/// Idempotent: `clean_key(&clean_key(x)) == clean_key(x)`.
pub fn clean_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            '(' | ')' => None,
            '-' => Some('_'),
            c if c.is_whitespace() => Some('_'),
            c => Some(c),
        })
        .collect()
}

/// True for blank text and the sentinel tokens
pub fn is_empty_sentinel(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || EMPTY_SENTINELS.contains(&trimmed)
}

/// Replace sentinel cells with null
fn sanitize(cell: Option<&RawCell>) -> Option<&RawCell> {
    match cell? {
        RawCell::Empty => None,
        RawCell::Text(s) if is_empty_sentinel(s) => None,
        other => Some(other),
    }
}

/// Append `_2`, `_3`, ... until the key is free
fn disambiguate(key: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&key) {
        return key;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", key, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn infer_kind(cells: &[Option<&RawCell>]) -> ColumnKind {
    let mut present = cells.iter().flatten().peekable();
    if present.peek().is_none() {
        return ColumnKind::Text;
    }
    if present.all(|c| matches!(c, RawCell::Number(_))) {
        ColumnKind::Number
    } else {
        ColumnKind::Text
    }
}

fn build_values(kind: ColumnKind, cells: &[Option<&RawCell>]) -> ColumnValues {
    match kind {
        ColumnKind::Number => ColumnValues::Number(
            cells
                .iter()
                .map(|c| match c {
                    Some(RawCell::Number(n)) => Some(*n),
                    _ => None,
                })
                .collect(),
        ),
        ColumnKind::Text => {
            ColumnValues::Text(cells.iter().map(|c| c.map(RawCell::to_text)).collect())
        }
    }
}

/// Slice the sheet at `header_row` and produce the normalized table.
///
/// Rows below the header that are entirely empty are dropped, as are
/// columns with neither a header nor any value.
pub fn normalize_sheet(sheet: &RawSheet, header_row: usize) -> AnalyticsResult<NormalizedTable> {
    let header = sheet.row(header_row).unwrap_or(&[]);
    let data_rows = sheet.rows.get(header_row + 1..).unwrap_or(&[]);

    let width = data_rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);

    let rows: Vec<Vec<Option<&RawCell>>> = data_rows
        .iter()
        .map(|row| (0..width).map(|c| sanitize(row.get(c))).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(Option::is_some))
        .collect();

    let mut taken = HashSet::new();
    let mut columns = Vec::with_capacity(width);

    for col in 0..width {
        let cells: Vec<Option<&RawCell>> = rows.iter().map(|r| r[col]).collect();
        let name = header
            .get(col)
            .map(|cell| clean_key(&cell.to_text()))
            .filter(|k| !k.is_empty());

        let key = match name {
            Some(key) => key,
            None if cells.iter().all(Option::is_none) => continue,
            None => format!("unnamed_{}", col),
        };
        let key = disambiguate(key, &taken);
        taken.insert(key.clone());

        let kind = infer_kind(&cells);
        columns.push(Column::new(key, build_values(kind, &cells)));
    }

    NormalizedTable::from_columns(columns).map_err(AnalyticsError::InvalidTable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_row(cells: &[&str]) -> Vec<RawCell> {
        cells.iter().map(|c| RawCell::from(*c)).collect()
    }

    #[test]
    fn test_clean_key() {
        assert_eq!(clean_key("  Funding Received "), "funding_received");
        assert_eq!(clean_key("Founding-Year"), "founding_year");
        assert_eq!(clean_key("Amount (USD)"), "amount_usd");
        assert_eq!(clean_key("Company"), "company");
        assert_eq!(clean_key("Key\tPeople"), "key_people");
    }

    #[test]
    fn test_clean_key_idempotent() {
        let samples = [
            "  Funding Received ",
            "(\tTier)",
            "Hot - Startup?",
            "( a )",
            "ÉTAPE Série",
            "",
            "___",
            "Contact (Phone-No.)",
        ];
        for s in samples {
            let once = clean_key(s);
            assert_eq!(clean_key(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_sentinels() {
        for s in ["-", "\u{2014}", "None", "nan", "NaN", "", "   ", " - "] {
            assert!(is_empty_sentinel(s), "{:?} should be empty", s);
        }
        for s in ["0", "none yet", "Nan Tech", "n/a"] {
            assert!(!is_empty_sentinel(s), "{:?} should be kept", s);
        }
    }

    #[test]
    fn test_normalize_types_and_nulls() {
        let sheet = RawSheet::new(vec![
            text_row(&["Company", "Founded", "Funding Received"]),
            vec![
                RawCell::from("Acme"),
                RawCell::Number(2015.0),
                RawCell::from("$2M"),
            ],
            vec![RawCell::from("Beta"), RawCell::from("-"), RawCell::Number(500.0)],
        ]);

        let table = normalize_sheet(&sheet, 0).unwrap();
        assert_eq!(
            table.column_keys(),
            vec!["company", "founded", "funding_received"]
        );
        assert_eq!(
            table.column("founded").unwrap().values,
            ColumnValues::Number(vec![Some(2015.0), None])
        );
        assert_eq!(
            table.column("funding_received").unwrap().values,
            ColumnValues::Text(vec![Some("$2M".into()), Some("500".into())])
        );
    }

    #[test]
    fn test_duplicate_keys_get_suffixes() {
        let sheet = RawSheet::new(vec![
            text_row(&["City", "city ", "CITY", "City_2"]),
            text_row(&["a", "b", "c", "d"]),
        ]);
        let table = normalize_sheet(&sheet, 0).unwrap();
        assert_eq!(
            table.column_keys(),
            vec!["city", "city_2", "city_3", "city_2_2"]
        );
    }

    #[test]
    fn test_blank_rows_and_unnamed_columns() {
        let sheet = RawSheet::new(vec![
            vec![
                RawCell::from("Company"),
                RawCell::Empty,
                RawCell::Empty,
            ],
            vec![RawCell::from("Acme"), RawCell::Empty, RawCell::from("note")],
            vec![RawCell::Empty, RawCell::from("None"), RawCell::Empty],
            vec![RawCell::from("Beta")],
        ]);
        let table = normalize_sheet(&sheet, 0).unwrap();
        assert_eq!(table.column_keys(), vec!["company", "unnamed_2"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.text(1, "company").as_deref(), Some("Beta"));
        assert_eq!(table.cell(1, "unnamed_2"), None);
    }

    #[test]
    fn test_header_only_sheet() {
        let sheet = RawSheet::new(vec![text_row(&["Company", "Sector"])]);
        let table = normalize_sheet(&sheet, 0).unwrap();
        assert_eq!(table.column_keys(), vec!["company", "sector"]);
        assert!(table.is_empty());
    }
}
