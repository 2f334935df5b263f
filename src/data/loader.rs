use std::collections::HashSet;
use std::path::Path;

use log::{debug, info};

use super::model::{Column, ColumnKind, Dataset};
use crate::error::{AnalysisError, Result};

/// Cells treated as null, matching the pandas `read_csv` defaults.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A string column is categorical when unique/non-null is below this ratio.
const CATEGORICAL_RATIO: f64 = 0.5;

/// Upper bound on distinct values for a categorical column.
const MAX_CATEGORICAL_UNIQUE: usize = 1000;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a CSV file into a [`Dataset`].
///
/// The file is read as ISO-8859-1, so any byte sequence decodes. A header row
/// is required and every record must have the same number of fields.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let name = dataset_name(path);
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| AnalysisError::data_load(path, e))?;

    let dataset = read_records(reader, name).map_err(|e| match e {
        AnalysisError::DataLoad { message, .. } => AnalysisError::data_load(path, message),
        other => other,
    })?;

    info!(
        "loaded {} ({} rows x {} columns)",
        path.display(),
        dataset.row_count(),
        dataset.column_count()
    );
    Ok(dataset)
}

/// Parse CSV text that is already in memory.
#[cfg(test)]
pub fn parse_csv_bytes(name: &str, bytes: &[u8]) -> Result<Dataset> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    read_records(reader, name.to_string())
}

/// Lower-cased file stem up to the first `.`: `Data.v2.csv` → `data`.
pub fn dataset_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or("")
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Record reading
// ---------------------------------------------------------------------------

fn read_records<R: std::io::Read>(mut reader: csv::Reader<R>, name: String) -> Result<Dataset> {
    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| AnalysisError::data_load(&name, e))?
        .iter()
        .map(decode_latin1)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(AnalysisError::data_load(&name, "no columns to parse"));
    }
    let headers = dedupe_headers(headers);

    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.byte_records().enumerate() {
        let record =
            result.map_err(|e| AnalysisError::data_load(&name, format!("row {row_no}: {e}")))?;
        for (col_idx, field) in record.iter().enumerate() {
            raw_columns[col_idx].push(decode_latin1(field));
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(header, raw)| {
            let column = build_column(header, &raw);
            debug!("column '{}' inferred as {}", column.name, column.kind);
            column
        })
        .collect();

    Dataset::new(name.clone(), columns).map_err(|e| AnalysisError::data_load(&name, e))
}

/// ISO-8859-1 maps every byte to the code point with the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Repeated header names get `.1`, `.2`, … suffixes, as pandas does.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .into_iter()
        .map(|h| {
            if seen.insert(h.clone()) {
                return h;
            }
            let mut n = 1;
            loop {
                let candidate = format!("{h}.{n}");
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

fn is_null(cell: &str) -> bool {
    NULL_MARKERS.contains(&cell)
}

fn build_column(name: String, raw: &[String]) -> Column {
    let cells: Vec<Option<&str>> = raw
        .iter()
        .map(|s| if is_null(s) { None } else { Some(s.as_str()) })
        .collect();

    let non_null: Vec<&str> = cells.iter().flatten().copied().collect();
    if non_null.is_empty() {
        return Column::strings(name, ColumnKind::Text, vec![None; raw.len()]);
    }

    if non_null.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
        let values = cells
            .iter()
            .map(|c| c.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect();
        return Column::numeric(name, values);
    }

    let unique: HashSet<&str> = non_null.iter().copied().collect();
    let ratio = unique.len() as f64 / non_null.len() as f64;
    let kind = if ratio < CATEGORICAL_RATIO && unique.len() <= MAX_CATEGORICAL_UNIQUE {
        ColumnKind::Categorical
    } else {
        ColumnKind::Text
    };

    let values = cells.iter().map(|c| c.map(str::to_string)).collect();
    Column::strings(name, kind, values)
}
