// crates/genmix-core/src/error.rs

use thiserror::Error;

use crate::source::{RecordError, SourceError};
use crate::table::TableError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Upstream source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Upstream payload rejected: {0}")]
    Record(#[from] RecordError),

    #[error("Table operation failed: {0}")]
    Table(#[from] TableError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
