use async_trait::async_trait;
use genmix_core::source::{DataSource, FetchOutcome, FetchRequest, SourceError, UpstreamPayload};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::UpstreamConfig;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fetches generation data from the public API, authenticating with an `api-key` header.
#[derive(Clone)]
pub struct HttpDataSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpDataSource {
    pub fn new(config: &UpstreamConfig, api_key: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, SourceError> {
        let from = request.from.format(DATE_FORMAT).to_string();
        let to = request.to.format(DATE_FORMAT).to_string();

        let response = self
            .client
            .get(&self.base_url)
            .header("api-key", &self.api_key)
            .query(&[
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("dataset", request.dataset.as_str()),
            ])
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        let status = response.status();
        debug!(%status, url = %self.base_url, "upstream responded");
        if status != StatusCode::OK {
            return Ok(FetchOutcome::Unavailable {
                status: status.as_u16(),
            });
        }

        let payload = response
            .json::<UpstreamPayload>()
            .await
            .map_err(|err| SourceError::Decode(err.to_string()))?;
        Ok(FetchOutcome::Payload(payload))
    }
}
