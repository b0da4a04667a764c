//! Header-locating loader - spreadsheet → RawSheet → NormalizedTable

use crate::config::AnalyticsConfig;
use crate::core::normalize::normalize_sheet;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{NormalizedTable, RawCell, RawSheet};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Cell text that marks the header row
pub const HEADER_TOKEN: &str = "company";

/// How far to look for the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderPolicy {
    /// Rows examined by the bounded scan
    pub scan_rows: usize,
    /// Continue past the bounded scan to the end of the sheet
    pub full_scan_fallback: bool,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self {
            scan_rows: crate::config::DEFAULT_HEADER_SCAN_ROWS,
            full_scan_fallback: false,
        }
    }
}

impl From<&AnalyticsConfig> for HeaderPolicy {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            scan_rows: config.header_scan_rows,
            full_scan_fallback: config.full_scan_fallback,
        }
    }
}

/// Result of a slow-path load
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLoad {
    /// Absolute (0-based) sheet row used as the header
    pub header_row: usize,
    pub table: NormalizedTable,
}

fn is_header_row(row: &[RawCell]) -> bool {
    row.iter()
        .any(|cell| cell.to_text().trim().to_lowercase() == HEADER_TOKEN)
}

/// Index of the first row holding a `company` cell.
///
/// Returns the number of rows scanned on failure.
pub fn locate_header(sheet: &RawSheet, policy: &HeaderPolicy) -> Result<usize, usize> {
    let bounded = policy.scan_rows.min(sheet.height());
    if let Some(idx) = sheet.rows[..bounded].iter().position(|r| is_header_row(r)) {
        return Ok(idx);
    }
    if !policy.full_scan_fallback || bounded == sheet.height() {
        return Err(bounded);
    }
    debug!(scanned = bounded, "bounded header scan exhausted, scanning full sheet");
    sheet.rows[bounded..]
        .iter()
        .position(|r| is_header_row(r))
        .map(|idx| bounded + idx)
        .ok_or(sheet.height())
}

/// Excel serial date → ISO text (1900 date system)
fn excel_serial_to_text(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let dt = epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
    if dt.time() == NaiveTime::from_hms_opt(0, 0, 0)? {
        Some(dt.format("%Y-%m-%d").to_string())
    } else {
        Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::from(s.as_str()),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_text(dt.as_f64())
            .map(RawCell::Text)
            .unwrap_or(RawCell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::from(s.as_str()),
    }
}

/// Range → RawSheet, re-inserting the blank rows/columns calamine trims
fn range_to_sheet(range: &Range<Data>) -> RawSheet {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![RawCell::Empty; col_offset];
        cells.extend(row.iter().map(convert_cell));
        rows.push(cells);
    }
    RawSheet::new(rows)
}

/// Loads a startup spreadsheet whose header row sits somewhere below free-form preamble rows
pub struct ExcelImporter {
    path: PathBuf,
    sheet: Option<String>,
    policy: HeaderPolicy,
}

impl ExcelImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sheet: None,
            policy: HeaderPolicy::default(),
        }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self {
            path: config.source.clone(),
            sheet: config.sheet.clone(),
            policy: HeaderPolicy::from(config),
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_policy(mut self, policy: HeaderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the worksheet verbatim, no header assumed
    pub fn read_raw(&self) -> AnalyticsResult<RawSheet> {
        if !self.path.exists() {
            return Err(AnalyticsError::SourceMissing(self.path.clone()));
        }

        let mut workbook = open_workbook_auto(&self.path)?;
        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| AnalyticsError::Excel("workbook contains no sheets".to_string()))?,
        };

        debug!(sheet = %sheet_name, path = %self.path.display(), "reading worksheet");
        let range = workbook.worksheet_range(&sheet_name)?;
        Ok(range_to_sheet(&range))
    }

    /// Full slow path: read, locate the header, normalize
    pub fn import(&self) -> AnalyticsResult<SheetLoad> {
        info!(path = %self.path.display(), "scanning header row");
        let raw = self.read_raw()?;

        let header_row = locate_header(&raw, &self.policy).map_err(|scanned_rows| {
            AnalyticsError::HeaderNotFound {
                path: self.path.clone(),
                scanned_rows,
            }
        })?;
        debug!(header_row, rows = raw.height(), "header row located");

        info!("normalizing data types");
        let table = normalize_sheet(&raw, header_row)?;
        Ok(SheetLoad { header_row, table })
    }
}
