//! Reading order intents from files produced by the curator's pipeline.
//!
//! Two shapes are accepted: a JSON object `{ "token": weight }`, or a CSV
//! table whose header names the tokens and whose last row holds the target
//! weights.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, instrument};

use crate::intent::types::OrderIntent;

#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("I/O failure reading portfolio: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV portfolio: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON portfolio: {0}")]
    Json(#[from] serde_json::Error),
    #[error("portfolio has no weight rows")]
    Empty,
    #[error("invalid weight '{value}' for column {column}")]
    InvalidWeight { column: String, value: String },
    #[error("unsupported portfolio format: {0}")]
    UnsupportedFormat(String),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;

#[derive(Debug, Clone, Default)]
pub struct PortfolioOptions {
    /// Suffix removed from CSV column names (e.g. `_1` from a factor export).
    pub strip_suffix: Option<String>,
}

impl PortfolioOptions {
    fn column_token(&self, column: &str) -> String {
        let lowered = column.trim().to_lowercase();
        match self.strip_suffix.as_deref() {
            Some(suffix) if !suffix.is_empty() => lowered.replace(&suffix.to_lowercase(), ""),
            _ => lowered,
        }
    }
}

/// Target allocation from the last row of a CSV table; zero columns dropped.
pub fn load_csv<R: Read>(reader: R, options: &PortfolioOptions) -> PortfolioResult<OrderIntent> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut last = None;
    for record in reader.records() {
        last = Some(record?);
    }
    let row = last.ok_or(PortfolioError::Empty)?;

    let mut intent = OrderIntent::new();
    for (column, value) in headers.iter().zip(row.iter()) {
        let weight: f64 = value.parse().map_err(|_| PortfolioError::InvalidWeight {
            column: column.to_string(),
            value: value.to_string(),
        })?;
        if weight != 0.0 {
            intent.insert(options.column_token(column), weight);
        }
    }

    debug!(columns = headers.len(), kept = intent.len(), "Loaded CSV portfolio row");
    Ok(intent)
}

pub fn load_json<R: Read>(reader: R) -> PortfolioResult<OrderIntent> {
    Ok(serde_json::from_reader(reader)?)
}

#[instrument(skip(options))]
pub fn load_path(path: &Path, options: &PortfolioOptions) -> PortfolioResult<OrderIntent> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_csv(File::open(path)?, options),
        "json" => load_json(File::open(path)?),
        other => Err(PortfolioError::UnsupportedFormat(other.to_string())),
    }
}
