use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::aggregator::{aggregate, AggregateResult};
use crate::error::Result;
use crate::outlier_filter::remove_outliers;
use crate::shaper::{shape_records, ColumnKey};
use crate::source::{DataSource, FetchOutcome, FetchRequest};
use crate::types::RawRecord;

/// Both aggregation passes over one record set.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    #[serde(rename = "type")]
    pub by_type: AggregateResult,
    pub categorized: AggregateResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PipelineResponse {
    Aggregated(PipelineOutput),
    /// Upstream refused the request; serialized as `{"data": []}`.
    Unavailable { data: Vec<Value> },
}

impl PipelineResponse {
    pub fn unavailable() -> Self {
        PipelineResponse::Unavailable { data: Vec::new() }
    }

    pub fn output(&self) -> Option<&PipelineOutput> {
        match self {
            PipelineResponse::Aggregated(output) => Some(output),
            PipelineResponse::Unavailable { .. } => None,
        }
    }
}

/// Shape, clean and aggregate the records for a single column key.
pub fn run_pass(records: &[RawRecord], key: ColumnKey) -> Result<AggregateResult> {
    let wide = shape_records(records, key)?;
    let cleaned = remove_outliers(&wide)?;
    info!(
        ?key,
        rows = wide.height(),
        kept = cleaned.height(),
        "pass cleaned"
    );
    Ok(aggregate(&cleaned)?)
}

/// Runs the by-type and by-category passes over the same records.
pub fn run_passes(records: &[RawRecord]) -> Result<PipelineOutput> {
    let by_type = run_pass(records, ColumnKey::GenerationSource)?;
    let categorized = run_pass(records, ColumnKey::Category)?;
    Ok(PipelineOutput {
        by_type,
        categorized,
    })
}

/// Fetches one window from `source` and aggregates it.
///
/// A non-success upstream status degrades to [`PipelineResponse::Unavailable`]; transport
/// failures and malformed payloads are errors.
pub async fn execute(source: &dyn DataSource, request: &FetchRequest) -> Result<PipelineResponse> {
    let payload = match source.fetch(request).await? {
        FetchOutcome::Payload(payload) => payload,
        FetchOutcome::Unavailable { status } => {
            warn!(status, from = %request.from, to = %request.to, "upstream request failed");
            return Ok(PipelineResponse::unavailable());
        }
    };

    let records = payload.to_records()?;
    info!(
        records = records.len(),
        from = %request.from,
        to = %request.to,
        "upstream request successful"
    );

    Ok(PipelineResponse::Aggregated(run_passes(&records)?))
}
