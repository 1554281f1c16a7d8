//! Uploaded files

use super::AcquisitionError;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use serde_json::{Map, Value};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Turn an uploaded file into extraction input
///
/// CSV files and spreadsheets (first sheet) become a JSON array of row
/// objects keyed by header, which the extractor chunks by whole rows.
/// Anything else must be UTF-8 text.
pub fn read_upload(name: &str, bytes: &[u8]) -> Result<String, AcquisitionError> {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match extension.as_str() {
        "csv" | "xlsx" | "xlsm" | "xls" | "ods" => {
            let rows = if extension == "csv" {
                csv_rows(bytes)?
            } else {
                sheet_rows(bytes)?
            };
            if rows.is_empty() {
                return Err(AcquisitionError::Empty(name.to_string()));
            }
            debug!(file = name, rows = rows.len(), "tabular upload parsed");
            serde_json::to_string(&Value::Array(rows))
                .map_err(|e| AcquisitionError::File(e.to_string()))
        }
        _ => {
            let text = std::str::from_utf8(bytes).map_err(|_| {
                AcquisitionError::Input(format!(
                    "Failed to process file: {} is not valid UTF-8 text",
                    name
                ))
            })?;
            if text.trim().is_empty() {
                return Err(AcquisitionError::Empty(name.to_string()));
            }
            Ok(text.to_string())
        }
    }
}

/// Parse CSV rows into JSON objects keyed by header
fn csv_rows(bytes: &[u8]) -> Result<Vec<Value>, AcquisitionError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(bytes))
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AcquisitionError::File(format!("CSV header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| AcquisitionError::File(format!("CSV row {}: {e}", row_idx + 1)))?;

        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell_value(cell)))
            .collect();

        if row.values().all(Value::is_null) {
            continue;
        }
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

/// Parse the first sheet of a workbook into JSON objects keyed by the
/// header row
fn sheet_rows(bytes: &[u8]) -> Result<Vec<Value>, AcquisitionError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AcquisitionError::File(format!("spreadsheet: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AcquisitionError::File("spreadsheet has no sheet".to_string()))?
        .map_err(|e| AcquisitionError::File(format!("spreadsheet: {e}")))?;

    let mut lines = range.rows();
    let headers: Vec<String> = match lines.next() {
        Some(first) => first.iter().map(|cell| cell.to_string().trim().to_string()).collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for line in lines {
        let row: Map<String, Value> = headers
            .iter()
            .zip(line.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), sheet_cell_value(cell)))
            .collect();

        if row.values().all(Value::is_null) {
            continue;
        }
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

/// Type a spreadsheet cell the way a CSV cell is typed
///
/// Whole floats become integers and date cells become `YYYY-MM-DD`.
fn sheet_cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => cell_value(s.trim()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Value::from(*f as i64)
        }
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) => match cell.as_date() {
            Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            None => Value::String(cell.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

/// `;` when the header line uses it more than `,` (spreadsheet exports in
/// French locales), `,` otherwise
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let count = |d: u8| header.iter().filter(|b| **b == d).count();
    if count(b';') > count(b',') {
        b';'
    } else {
        b','
    }
}

/// Type a CSV cell: empty is null, plain numbers are numbers
///
/// Numbers are only recognized when they print back identically, so values
/// such as phone numbers or postcodes with leading zeros stay text.
fn cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        if i.to_string() == cell {
            return Value::from(i);
        }
    }
    if let Some((whole, _)) = cell.split_once('.') {
        let whole_ok = whole
            .parse::<i64>()
            .map(|w| w.to_string() == whole)
            .unwrap_or(false);
        if whole_ok {
            if let Some(n) = cell.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                return Value::Number(n);
            }
        }
    }
    Value::String(cell.to_string())
}
