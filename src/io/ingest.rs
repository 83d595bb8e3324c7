//! CSV ingest.
//!
//! Turns a measurement CSV into a `Dataset`. The schema is strict: the columns
//! `under_y`, `theta`, and `distance` must exist under exactly those names
//! (surrounding whitespace and a UTF-8 BOM are tolerated). Any unreadable
//! file, missing column, or unparsable value aborts the load; there are no
//! partially loaded datasets.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Dataset, FEATURE_COLUMNS, RawSample, TARGET_COLUMN};
use crate::error::AppError;

/// Load every row of `path` into a dataset, preserving file order.
pub fn load_dataset(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::load(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_dataset(file, path)
}

fn read_dataset<R: std::io::Read>(reader: R, path: &Path) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::load(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .clone();
    let header_map = build_header_map(&headers);

    let under_y = require_column(&header_map, FEATURE_COLUMNS[0], path)?;
    let theta = require_column(&header_map, FEATURE_COLUMNS[1], path)?;
    let distance = require_column(&header_map, TARGET_COLUMN, path)?;

    let mut samples = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| {
            AppError::load(format!("CSV parse error in '{}' at line {line}: {e}", path.display()))
        })?;

        samples.push(RawSample {
            under_y: parse_field(&record, under_y, FEATURE_COLUMNS[0], line, path)?,
            theta: parse_field(&record, theta, FEATURE_COLUMNS[1], line, path)?,
            distance: parse_field(&record, distance, TARGET_COLUMN, line, path)?,
        });
    }

    if samples.is_empty() {
        return Err(AppError::load(format!("CSV '{}' contains no data rows.", path.display())));
    }

    tracing::debug!(path = %path.display(), rows = samples.len(), "loaded dataset");
    Ok(Dataset::new(samples))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM; without
    // stripping it the first column would be reported missing.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn require_column(header_map: &HashMap<String, usize>, name: &str, path: &Path) -> Result<usize, AppError> {
    header_map.get(name).copied().ok_or_else(|| {
        AppError::load(format!(
            "Missing required column `{name}` in '{}'.",
            path.display()
        ))
    })
}

fn parse_field(record: &StringRecord, idx: usize, name: &str, line: usize, path: &Path) -> Result<f64, AppError> {
    let raw = record.get(idx).unwrap_or("");
    let value: f64 = raw.parse().map_err(|_| {
        AppError::load(format!(
            "Invalid `{name}` value '{raw}' in '{}' at line {line}.",
            path.display()
        ))
    })?;
    if !value.is_finite() {
        return Err(AppError::load(format!(
            "Non-finite `{name}` value in '{}' at line {line}.",
            path.display()
        )));
    }
    Ok(value)
}
