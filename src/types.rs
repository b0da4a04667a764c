use serde::Serialize;
use std::fmt;

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    let rounded = (n * 1e6).round() / 1e6;
    let text = format!("{:.6}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Shortest text that parses back to the same value (`2015`, `0.0000004`)
pub fn number_text(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

//==============================================================================
// Raw sheet (no header assumed)
//==============================================================================

/// A single cell as read verbatim from the workbook
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl RawCell {
    /// Render the cell as text (empty cells render as "")
    pub fn to_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.clone(),
            RawCell::Number(n) => number_text(*n),
            RawCell::Bool(b) => b.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        RawCell::Number(n)
    }
}

/// Untyped 2-D grid; row indices are absolute sheet rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<RawCell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, idx: usize) -> Option<&[RawCell]> {
        self.rows.get(idx).map(|r| r.as_slice())
    }
}

//==============================================================================
// Normalized table
//==============================================================================

/// Storage type of a column, decided once at normalization time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Text,
    Number,
}

/// Column values (homogeneous, nullable)
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Number(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnValues::Text(_) => ColumnKind::Text,
            ColumnValues::Number(_) => ColumnKind::Number,
        }
    }

    pub fn get(&self, row: usize) -> Option<CellRef<'_>> {
        match self {
            ColumnValues::Text(v) => v.get(row)?.as_deref().map(CellRef::Text),
            ColumnValues::Number(v) => (*v.get(row)?).map(CellRef::Number),
        }
    }
}

/// A column of the normalized table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn new(key: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.values.kind()
    }
}

/// Borrowed, non-null cell value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellRef<'a> {
    Text(&'a str),
    Number(f64),
}

impl CellRef<'_> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellRef::Number(n) => Some(*n),
            CellRef::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for CellRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRef::Text(s) => f.write_str(s),
            CellRef::Number(n) => f.write_str(&number_text(*n)),
        }
    }
}

/// The canonical, cleaned in-memory representation of the spreadsheet.
///
/// Columns keep sheet order; every column holds exactly `row_count` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl NormalizedTable {
    /// Build a table from columns of equal length
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, String> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(format!(
                "column '{}' has {} values, expected {}",
                bad.key,
                bad.values.len(),
                row_count
            ));
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.key == col.key) {
                return Err(format!("duplicate column key '{}'", col.key));
            }
        }
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Non-null value at (row, key)
    pub fn cell(&self, row: usize, key: &str) -> Option<CellRef<'_>> {
        self.column(key)?.values.get(row)
    }

    /// Cell rendered as text; null cells and unknown columns give `None`
    pub fn text(&self, row: usize, key: &str) -> Option<String> {
        self.cell(row, key).map(|c| c.to_string())
    }
}
