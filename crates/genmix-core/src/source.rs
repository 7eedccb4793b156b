//! The upstream generation-data provider, seen from the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{RawRecord, DATE_ID, REGION};

pub const DEFAULT_DATASET: &str = "task_generation_h";
pub const GENERATION_COLUMN: &str = "generation";
pub const VALUE_COLUMN: &str = "value";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("payload is missing column {0}")]
    MissingColumn(&'static str),
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row} has an invalid timestamp {value:?}")]
    InvalidTimestamp { row: usize, value: String },
    #[error("row {row} has a non-text {column}: {value}")]
    InvalidLabel {
        row: usize,
        column: &'static str,
        value: Value,
    },
    #[error("row {row} has a non-numeric value: {value}")]
    InvalidValue { row: usize, value: Value },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub dataset: String,
}

impl FetchRequest {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to,
            dataset: DEFAULT_DATASET.to_string(),
        }
    }

    pub fn default_from() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 10, 1).unwrap_or_default()
    }

    pub fn default_to() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 12, 31).unwrap_or_default()
    }
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self::new(Self::default_from(), Self::default_to())
    }
}

/// Tabular upstream response: column names plus rows of JSON cells.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamPayload {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Payload(UpstreamPayload),
    /// The provider answered with a non-success status.
    Unavailable { status: u16 },
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, SourceError>;
}

impl UpstreamPayload {
    fn column_index(&self, name: &'static str) -> Result<usize, RecordError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or(RecordError::MissingColumn(name))
    }

    /// Decodes rows into records, converting MWh to GWh. A null value becomes a record without
    /// a reading.
    pub fn to_records(&self) -> Result<Vec<RawRecord>, RecordError> {
        let date_idx = self.column_index(DATE_ID)?;
        let region_idx = self.column_index(REGION)?;
        let generation_idx = self.column_index(GENERATION_COLUMN)?;
        let value_idx = self.column_index(VALUE_COLUMN)?;

        let mut records = Vec::with_capacity(self.data.len());
        for (row, cells) in self.data.iter().enumerate() {
            if cells.len() != self.columns.len() {
                return Err(RecordError::RowWidth {
                    row,
                    expected: self.columns.len(),
                    found: cells.len(),
                });
            }

            let value_mwh = match &cells[value_idx] {
                Value::Null => None,
                Value::Number(number) => Some(number.as_f64().ok_or_else(|| {
                    RecordError::InvalidValue {
                        row,
                        value: cells[value_idx].clone(),
                    }
                })?),
                other => {
                    return Err(RecordError::InvalidValue {
                        row,
                        value: other.clone(),
                    })
                }
            };

            let raw_date = text_cell(&cells[date_idx], row, DATE_ID)?;
            let date_id = parse_timestamp(raw_date).ok_or_else(|| RecordError::InvalidTimestamp {
                row,
                value: raw_date.to_string(),
            })?;
            let region = text_cell(&cells[region_idx], row, REGION)?;
            let generation = text_cell(&cells[generation_idx], row, GENERATION_COLUMN)?;

            records.push(match value_mwh {
                Some(value_mwh) => RawRecord::from_mwh(date_id, region, generation, value_mwh),
                None => RawRecord::without_value(date_id, region, generation),
            });
        }

        Ok(records)
    }
}

fn text_cell<'a>(cell: &'a Value, row: usize, column: &'static str) -> Result<&'a str, RecordError> {
    cell.as_str().ok_or_else(|| RecordError::InvalidLabel {
        row,
        column,
        value: cell.clone(),
    })
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an upstream `date_id`. Offsets are normalised to UTC; bare dates mean midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.with_timezone(&Utc).naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}
