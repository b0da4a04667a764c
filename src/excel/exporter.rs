//! Excel exporter - filtered list view → .xlsx

use crate::error::AnalyticsResult;
use crate::types::{CellRef, NormalizedTable};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

const SHEET_NAME: &str = "Startups";

/// Writes selected rows and columns of a table to a single worksheet
pub struct TableExporter<'a> {
    table: &'a NormalizedTable,
    columns: Vec<String>,
    rows: Vec<usize>,
}

impl<'a> TableExporter<'a> {
    /// Columns not present in the table are ignored
    pub fn new(table: &'a NormalizedTable, columns: Vec<String>, rows: Vec<usize>) -> Self {
        let columns = columns
            .into_iter()
            .filter(|c| table.column(c).is_some())
            .collect();
        Self {
            table,
            columns,
            rows,
        }
    }

    pub fn export(&self, output_path: &Path) -> AnalyticsResult<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let header_format = Format::new().set_bold();
        for (col_idx, key) in self.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, key, &header_format)?;
        }
        worksheet.set_freeze_panes(1, 0)?;

        for (out_row, &row) in self.rows.iter().enumerate() {
            let excel_row = (out_row + 1) as u32;
            for (col_idx, key) in self.columns.iter().enumerate() {
                match self.table.cell(row, key) {
                    Some(CellRef::Text(s)) => {
                        worksheet.write_string(excel_row, col_idx as u16, s)?;
                    }
                    Some(CellRef::Number(n)) => {
                        worksheet.write_number(excel_row, col_idx as u16, n)?;
                    }
                    None => {}
                }
            }
        }

        workbook.save(output_path)?;
        Ok(())
    }
}
