//! Cleaning and multi-resolution aggregation of per-region generation records.

pub mod aggregator;
pub mod categorizer;
pub mod error;
pub mod outlier_filter;
pub mod pipeline;
pub mod serializer;
pub mod shaper;
pub mod source;
pub mod table;
pub mod types;

pub use error::{PipelineError, Result};
pub use pipeline::{execute, run_passes, PipelineOutput, PipelineResponse};
