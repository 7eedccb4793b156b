use polars::prelude::*;
use thiserror::Error;

use crate::types::{is_key_column, DATE_ID, REGION};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("required column {0} is missing")]
    MissingColumn(&'static str),
    #[error("value column {0} collides with a key column")]
    ReservedColumn(String),
    #[error("column length mismatch for {column}: expected {expected}, found {found}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("key column {column} has a null at row {row}")]
    NullKey { column: &'static str, row: usize },
    #[error("timestamp {0} ms is out of range")]
    TimestampOutOfRange(i64),
}

/// How a column takes part in cleaning and aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Timestamp,
    Label,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

pub fn timestamp_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

/// A (date_id, region) keyed table with one column per generation source or category.
///
/// Column kinds are fixed when the table is built: `date_id` is the timestamp, `region` and
/// any non-numeric column are labels, and every numeric column is stored as `f64`. Only
/// numeric columns take part in outlier detection and aggregation.
#[derive(Debug, Clone)]
pub struct WideTable {
    frame: DataFrame,
    schema: Vec<ColumnSpec>,
}

impl WideTable {
    /// Builds a table from key vectors (epoch milliseconds, region) and named value columns.
    pub fn from_columns(
        date_ids: Vec<i64>,
        regions: Vec<String>,
        values: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, TableError> {
        let height = date_ids.len();
        if regions.len() != height {
            return Err(TableError::LengthMismatch {
                column: REGION.to_string(),
                expected: height,
                found: regions.len(),
            });
        }

        let mut columns: Vec<Column> = Vec::with_capacity(values.len() + 2);
        let mut schema = Vec::with_capacity(values.len() + 2);

        let date_series = Series::new(DATE_ID.into(), date_ids).cast(&timestamp_dtype())?;
        columns.push(date_series.into());
        schema.push(ColumnSpec {
            name: DATE_ID.to_string(),
            kind: ColumnKind::Timestamp,
        });

        columns.push(Series::new(REGION.into(), regions).into());
        schema.push(ColumnSpec {
            name: REGION.to_string(),
            kind: ColumnKind::Label,
        });

        for (name, cells) in values {
            if is_key_column(&name) {
                return Err(TableError::ReservedColumn(name));
            }
            if cells.len() != height {
                return Err(TableError::LengthMismatch {
                    column: name,
                    expected: height,
                    found: cells.len(),
                });
            }
            columns.push(Series::new(name.as_str().into(), cells).into());
            schema.push(ColumnSpec {
                name,
                kind: ColumnKind::Numeric,
            });
        }

        let frame = DataFrame::new(columns)?;
        Ok(Self { frame, schema })
    }

    /// Wraps an existing frame, declaring each column's kind from its dtype.
    ///
    /// `date_id` is cast to a millisecond datetime and `region` to a string. Float and
    /// 32/64-bit integer columns become numeric `f64` columns; everything else is a label.
    pub fn from_frame(frame: DataFrame) -> Result<Self, TableError> {
        if frame.column(DATE_ID).is_err() {
            return Err(TableError::MissingColumn(DATE_ID));
        }
        if frame.column(REGION).is_err() {
            return Err(TableError::MissingColumn(REGION));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(frame.width());
        let mut schema = Vec::with_capacity(frame.width());

        for column in frame.get_columns() {
            let name = column.name().to_string();
            let (converted, kind) = match name.as_str() {
                DATE_ID => (column.cast(&timestamp_dtype())?, ColumnKind::Timestamp),
                REGION => (column.cast(&DataType::String)?, ColumnKind::Label),
                _ => match column.dtype() {
                    DataType::Float64 => (column.clone(), ColumnKind::Numeric),
                    DataType::Float32
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt32
                    | DataType::UInt64 => {
                        (column.cast(&DataType::Float64)?, ColumnKind::Numeric)
                    }
                    _ => (column.clone(), ColumnKind::Label),
                },
            };
            columns.push(converted);
            schema.push(ColumnSpec { name, kind });
        }

        let frame = DataFrame::new(columns)?;
        Ok(Self { frame, schema })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.schema
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.kind)
    }

    /// Names of the numeric value columns, in table order.
    pub fn value_columns(&self) -> Vec<String> {
        self.schema
            .iter()
            .filter(|spec| spec.kind == ColumnKind::Numeric)
            .map(|spec| spec.name.clone())
            .collect()
    }

    /// `date_id` values as epoch milliseconds.
    pub fn date_ids(&self) -> Result<Vec<i64>, TableError> {
        let physical = self.frame.column(DATE_ID)?.cast(&DataType::Int64)?;
        let dates = physical.i64()?;
        (0..self.height())
            .map(|row| {
                dates.get(row).ok_or(TableError::NullKey {
                    column: DATE_ID,
                    row,
                })
            })
            .collect()
    }

    pub fn regions(&self) -> Result<Vec<String>, TableError> {
        let regions = self.frame.column(REGION)?.str()?;
        (0..self.height())
            .map(|row| {
                regions
                    .get(row)
                    .map(str::to_string)
                    .ok_or(TableError::NullKey {
                        column: REGION,
                        row,
                    })
            })
            .collect()
    }

    pub fn numeric_cells(&self, name: &str) -> Result<Vec<Option<f64>>, TableError> {
        let values = self.frame.column(name)?.f64()?;
        Ok(values.into_iter().collect())
    }

    /// Keeps the rows whose mask entry is `true`.
    pub fn retain_rows(&self, keep: &[bool]) -> Result<Self, TableError> {
        if keep.len() != self.height() {
            return Err(TableError::LengthMismatch {
                column: "row_mask".to_string(),
                expected: self.height(),
                found: keep.len(),
            });
        }

        let mask = BooleanChunked::from_slice("row_mask".into(), keep);
        let frame = self.frame.filter(&mask)?;
        Ok(Self {
            frame,
            schema: self.schema.clone(),
        })
    }

    /// Replaces every null or NaN numeric cell with `value`. Other columns are untouched.
    pub fn fill_missing(&self, value: f64) -> Result<Self, TableError> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.frame.width());

        for (column, spec) in self.frame.get_columns().iter().zip(&self.schema) {
            if spec.kind != ColumnKind::Numeric {
                columns.push(column.clone());
                continue;
            }

            let filled: Vec<f64> = column
                .f64()?
                .into_iter()
                .map(|cell| cell.filter(|present| !present.is_nan()).unwrap_or(value))
                .collect();
            columns.push(Series::new(column.name().clone(), filled).into());
        }

        Ok(Self {
            frame: DataFrame::new(columns)?,
            schema: self.schema.clone(),
        })
    }
}
