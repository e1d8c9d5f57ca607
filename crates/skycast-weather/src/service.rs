//! Results flow: cache lookup, fetch, normalize, archive, cache store.

use tracing::instrument;

use crate::archive::Archive;
use crate::cache::ForecastCache;
use crate::client::WeatherClient;
use crate::error::ForecastError;
use crate::normalize::normalize;
use crate::types::{ForecastSource, ForecastView, LocationQuery};

#[derive(Debug, Clone)]
pub struct ForecastService {
    client: WeatherClient,
    archive: Archive,
    api_key: String,
}

impl ForecastService {
    pub fn new(client: WeatherClient, archive: Archive, api_key: impl Into<String>) -> Self {
        Self {
            client,
            archive,
            api_key: api_key.into(),
        }
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Serve the forecast for `location`, from `cache` when possible.
    ///
    /// Nothing is cached or archived unless the fetch and normalization both
    /// succeed. A failed archive write is logged and does not fail the request.
    #[instrument(skip(self, cache), level = "info")]
    pub async fn results<C>(&self, cache: &C, location: &str) -> Result<ForecastView, ForecastError>
    where
        C: ForecastCache + ?Sized,
    {
        let query = LocationQuery::parse(location)?;

        if let Some(cached) = cache.get(query.as_str()) {
            if !cached.is_empty() {
                tracing::info!("Cache hit for {}", query);
                return Ok(ForecastView::new(&query, cached, ForecastSource::Cache, None));
            }
            tracing::warn!("Discarding empty cached forecast for {}", query);
            cache.delete(query.as_str());
        }

        tracing::info!("Cache miss for {}, fetching from API", query);
        let raw = self.client.fetch(query.as_str(), &self.api_key).await?;
        let forecast = normalize(&raw)?;

        let archive_path = match self.archive.archive(query.as_str(), &raw) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!("Failed to archive forecast for {}: {}", query, e);
                None
            }
        };

        cache.set(query.as_str(), forecast.clone());
        Ok(ForecastView::new(
            &query,
            forecast,
            ForecastSource::Upstream,
            archive_path,
        ))
    }
}
