// Parquet encoding of the normalized table

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{Column, ColumnValues, NormalizedTable};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::Builder;
use tracing::debug;

/// Bumped whenever the on-disk layout changes; older artifacts are rebuilt
pub const FORMAT_VERSION: &str = "2";

const META_FORMAT: &str = "startup_analytics.format";
const META_HEADER_ROW: &str = "startup_analytics.header_row";
const META_SOURCE: &str = "startup_analytics.source";
const META_SHEET: &str = "startup_analytics.sheet";
const META_SCAN_ROWS: &str = "startup_analytics.scan_rows";
const META_FULL_SCAN: &str = "startup_analytics.full_scan";

/// Everything that decides which table a slow load produces.
///
/// An artifact is only served when its key equals the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadKey {
    /// Source path with its directory canonicalized
    pub source: String,
    pub sheet: Option<String>,
    pub header_scan_rows: usize,
    pub full_scan_fallback: bool,
}

impl LoadKey {
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self {
            source: canonical_source(&config.source).display().to_string(),
            sheet: config.sheet.clone(),
            header_scan_rows: config.header_scan_rows,
            full_scan_fallback: config.full_scan_fallback,
        }
    }
}

/// Canonical directory joined with the file name, so the key survives the
/// source file being deleted
fn canonical_source(path: &Path) -> PathBuf {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Provenance stored alongside the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMeta {
    pub header_row: usize,
    pub key: LoadKey,
}

fn corrupt(context: &str, e: impl std::fmt::Display) -> AnalyticsError {
    AnalyticsError::CacheCorrupt(format!("{}: {}", context, e))
}

fn build_schema(table: &NormalizedTable, meta: &ArtifactMeta) -> ArrowSchema {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|col| {
            let dt = match col.values {
                ColumnValues::Text(_) => DataType::Utf8,
                ColumnValues::Number(_) => DataType::Float64,
            };
            Field::new(&col.key, dt, true)
        })
        .collect();

    let mut metadata = HashMap::from([
        (META_FORMAT.to_string(), FORMAT_VERSION.to_string()),
        (META_HEADER_ROW.to_string(), meta.header_row.to_string()),
        (META_SOURCE.to_string(), meta.key.source.clone()),
        (
            META_SCAN_ROWS.to_string(),
            meta.key.header_scan_rows.to_string(),
        ),
        (
            META_FULL_SCAN.to_string(),
            meta.key.full_scan_fallback.to_string(),
        ),
    ]);
    if let Some(sheet) = &meta.key.sheet {
        metadata.insert(META_SHEET.to_string(), sheet.clone());
    }
    ArrowSchema::new_with_metadata(fields, metadata)
}

fn column_to_array(col: &Column) -> ArrayRef {
    match &col.values {
        ColumnValues::Text(v) => Arc::new(StringArray::from(v.clone())),
        ColumnValues::Number(v) => Arc::new(Float64Array::from(v.clone())),
    }
}

fn write_parquet<W: Write + Send>(
    out: W,
    table: &NormalizedTable,
    meta: &ArtifactMeta,
) -> AnalyticsResult<()> {
    let schema = Arc::new(build_schema(table, meta));
    let arrays: Vec<ArrayRef> = table.columns().iter().map(column_to_array).collect();
    let options = RecordBatchOptions::new().with_row_count(Some(table.row_count()));
    let batch = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_dictionary_enabled(true)
        .build();

    let mut writer = ArrowWriter::try_new(out, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Write the table to `path` atomically.
///
/// Each writer gets its own hidden temp file in the target directory, which
/// is renamed over the artifact once complete; a failed write leaves no temp
/// file behind.
pub fn write_artifact(path: &Path, table: &NormalizedTable, meta: &ArtifactMeta) -> AnalyticsResult<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cache".to_string());

    let mut tmp = Builder::new()
        .prefix(&format!(".{}.", name))
        .suffix(".tmp")
        .tempfile_in(dir)?;
    write_parquet(tmp.as_file_mut(), table, meta)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "wrote cache artifact"
    );
    Ok(())
}

fn append_values(target: &mut ColumnValues, array: &dyn Array, key: &str) -> AnalyticsResult<()> {
    match target {
        ColumnValues::Text(values) => {
            let strings = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| corrupt(key, "expected a Utf8 column"))?;
            values.extend(strings.iter().map(|v| v.map(str::to_string)));
        }
        ColumnValues::Number(values) => {
            let numbers = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| corrupt(key, "expected a Float64 column"))?;
            values.extend(numbers.iter());
        }
    }
    Ok(())
}

/// Read a table back; every failure is reported as `CacheCorrupt`
pub fn read_artifact(path: &Path) -> AnalyticsResult<(NormalizedTable, ArtifactMeta)> {
    let file = fs::File::open(path).map_err(|e| corrupt("open", e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| corrupt("footer", e))?;
    let schema = builder.schema().clone();

    let metadata = schema.metadata();
    match metadata.get(META_FORMAT) {
        Some(v) if v == FORMAT_VERSION => {}
        other => {
            return Err(corrupt(
                "format",
                format!("expected version {}, found {:?}", FORMAT_VERSION, other),
            ))
        }
    }
    let header_row = metadata
        .get(META_HEADER_ROW)
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| corrupt("metadata", "missing header row"))?;
    let source = metadata
        .get(META_SOURCE)
        .cloned()
        .ok_or_else(|| corrupt("metadata", "missing source"))?;
    let header_scan_rows = metadata
        .get(META_SCAN_ROWS)
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| corrupt("metadata", "missing scan rows"))?;
    let full_scan_fallback = metadata
        .get(META_FULL_SCAN)
        .and_then(|v| v.parse::<bool>().ok())
        .ok_or_else(|| corrupt("metadata", "missing full scan flag"))?;
    let key = LoadKey {
        source,
        sheet: metadata.get(META_SHEET).cloned(),
        header_scan_rows,
        full_scan_fallback,
    };

    let mut columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|f| {
            let values = match f.data_type() {
                DataType::Utf8 => ColumnValues::Text(Vec::new()),
                DataType::Float64 => ColumnValues::Number(Vec::new()),
                other => return Err(corrupt(f.name(), format!("unsupported type {:?}", other))),
            };
            Ok(Column::new(f.name().clone(), values))
        })
        .collect::<AnalyticsResult<_>>()?;

    let reader = builder.build().map_err(|e| corrupt("reader", e))?;
    for batch in reader {
        let batch = batch.map_err(|e| corrupt("batch", e))?;
        for (idx, column) in columns.iter_mut().enumerate() {
            append_values(&mut column.values, batch.column(idx).as_ref(), &column.key)?;
        }
    }

    let table = NormalizedTable::from_columns(columns).map_err(|e| corrupt("table", e))?;
    Ok((table, ArtifactMeta { header_row, key }))
}
