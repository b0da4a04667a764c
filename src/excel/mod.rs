//! Excel import/export
//!
//! - Import: spreadsheet with a preamble → header row detection → normalized table
//! - Export: filtered list view → .xlsx

mod exporter;
mod importer;

pub use exporter::TableExporter;
pub use importer::{locate_header, ExcelImporter, HeaderPolicy, SheetLoad, HEADER_TOKEN};
