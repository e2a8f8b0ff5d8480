use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, MovieTable};
use super::prepare::prepare;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// RawTable – rows exactly as read, before cleaning
// ---------------------------------------------------------------------------

/// Row-oriented table straight out of a file. Text cells are kept verbatim
/// (only trimmed); numbers and booleans appear typed only when the file
/// itself typed them. The preparer decides what they mean.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// Each row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and prepare a movie dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one movie per line (the usual IMDb dump)
/// * `.json`    – `[{ "Series_Title": ..., "Released_Year": ..., ... }, ...]`
/// * `.parquet` – one column per field, Utf8 or numeric
pub fn load_file(path: &Path) -> Result<MovieTable, LoadError> {
    let raw = read_raw(path)?;
    log::info!(
        "Read {} raw rows with columns {:?} from {}",
        raw.rows.len(),
        raw.headers,
        path.display()
    );
    prepare(raw)
}

/// Read a file into a [`RawTable`] without cleaning it.
pub fn read_raw(path: &Path) -> Result<RawTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "json" => read_json(path),
        "parquet" | "pq" => read_parquet(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv_from(file)
}

/// Parse CSV text from any reader. Short rows are padded with nulls.
pub fn read_csv_from<R: std::io::Read>(input: R) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = (0..headers.len())
            .map(|i| text_cell(record.get(i).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

/// A text cell as read. Blank is null; anything else stays a string, so a
/// title like `2.0` or `NaN` is never mistaken for a number.
fn text_cell(s: &str) -> CellValue {
    match s.trim() {
        "" => CellValue::Null,
        t => CellValue::String(t.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `to_json(orient='records')`):
///
/// ```json
/// [
///   { "Series_Title": "The Godfather", "Released_Year": 1972, "No_of_Votes": "1,620,367" },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys in first-seen order.
fn read_json(path: &Path) -> Result<RawTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_json_str(&text)
}

pub fn read_json_str(text: &str) -> Result<RawTable, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root.as_array().ok_or(LoadError::NotAnArray)?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (row, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or(LoadError::NotAnObject { row })?;
        for key in obj.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => text_cell(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding a movie table.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Any column type other than strings,
/// integers, floats and booleans is rendered to text.
fn read_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }
    }

    Ok(RawTable { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue, LoadError> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => text_cell(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => text_cell(col.as_string::<i64>().value(row)),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            CellValue::from(Some(col.as_primitive::<Float32Type>().value(row) as f64))
        }
        DataType::Float64 => CellValue::from(Some(col.as_primitive::<Float64Type>().value(row))),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        _ => CellValue::String(array_value_to_string(col.as_ref(), row)?),
    };
    Ok(cell)
}
