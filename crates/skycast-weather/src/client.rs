//! Visual Crossing timeline API client.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::instrument;

use crate::error::FetchError;
use crate::retry::{with_retry, RetryConfig};
use crate::types::RawForecast;

pub const TIMELINE_API_BASE: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));

/// Fields requested per day; everything else is left out of the response.
const ELEMENTS: &str = "datetime,tempmax,tempmin,humidity";

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl WeatherClient {
    /// Client for the public API with the default timeout and no retries.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_options(
            TIMELINE_API_BASE,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            RetryConfig::none(),
        )
    }

    pub fn with_options(
        base_url: &str,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// URL of the 7-day forecast for `location`.
    pub fn forecast_url(&self, location: &str, api_key: &str) -> String {
        format!(
            "{}/{}/next7days?unitGroup=metric&elements={}&include=days&key={}&contentType=json",
            self.base_url,
            urlencoding::encode(location),
            urlencoding::encode(ELEMENTS),
            urlencoding::encode(api_key),
        )
    }

    /// Fetch the raw 7-day forecast for `location`.
    ///
    /// An empty `api_key` fails with `MissingCredential` before any request is made.
    #[instrument(skip(self, api_key), level = "info")]
    pub async fn fetch(&self, location: &str, api_key: &str) -> Result<RawForecast, FetchError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            tracing::error!("Weather API key not configured");
            return Err(FetchError::MissingCredential);
        }

        let url = self.forecast_url(location, api_key);
        let response = with_retry(&self.retry, || self.client.get(&url).send()).await?;
        let status = response.status();

        if status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Upstream rejected location (400): {}", body);
            return Err(FetchError::BadRequest(body));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Upstream returned {}: {}", status, body);
            return Err(FetchError::UpstreamError(status.as_u16()));
        }

        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Upstream body is not JSON: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;

        tracing::debug!("Fetched {} bytes of forecast data", body.len());
        Ok(RawForecast::new(value))
    }
}
