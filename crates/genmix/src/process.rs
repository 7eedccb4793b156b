use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use genmix_core::serializer::to_json_value;
use genmix_core::source::UpstreamPayload;
use genmix_core::{run_passes, PipelineResponse};

/// Aggregates a saved upstream payload (`{"columns": [...], "data": [[...]]}`) into the
/// response JSON served by `/data`.
pub fn render_payload(raw: &str, pretty: bool) -> Result<String> {
    let payload: UpstreamPayload =
        serde_json::from_str(raw).context("payload is not a columns/data table")?;
    let records = payload.to_records()?;
    let output = run_passes(&records)?;
    let body = to_json_value(&PipelineResponse::Aggregated(output))?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&body)?
    } else {
        serde_json::to_string(&body)?
    };
    Ok(rendered)
}

pub fn render_file(path: &Path, pretty: bool) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read payload {}", path.display()))?;
    render_payload(&raw, pretty)
}
