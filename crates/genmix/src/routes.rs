use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use genmix_core::source::FetchRequest;
use genmix_core::{execute, PipelineResponse};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_date(raw: Option<&str>, fallback: NaiveDate) -> Result<NaiveDate, chrono::ParseError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d"),
        None => Ok(fallback),
    }
}

impl DataQuery {
    /// Missing or empty bounds fall back to the default reporting window.
    pub fn to_request(&self) -> Result<FetchRequest, chrono::ParseError> {
        let from = parse_date(self.from.as_deref(), FetchRequest::default_from())?;
        let to = parse_date(self.to.as_deref(), FetchRequest::default_to())?;
        Ok(FetchRequest::new(from, to))
    }
}

pub async fn data(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<DataQuery>,
) -> Result<Json<PipelineResponse>, StatusCode> {
    let request = query.to_request().map_err(|err| {
        tracing::warn!(?query, "rejected data query: {err}");
        StatusCode::BAD_REQUEST
    })?;
    tracing::info!(from = %request.from, to = %request.to, "data requested");

    execute(app_state.source.as_ref(), &request)
        .await
        .map(Json)
        .map_err(|err| {
            tracing::error!("pipeline failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
