// Collaborator traits for upstream data sources
use crate::domain::chart::CitySample;
use crate::domain::reading::LiveSnapshot;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed upstream payload: {0}")]
    Payload(String),

    #[error("no data available from provider")]
    NoData,
}

/// A live AQI source for a coordinate pair.
#[async_trait]
pub trait AqiProvider: Send + Sync {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<LiveSnapshot, ProviderError>;
}

/// Bulk and current per-city samples for regional aggregation.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Recent daily measurements for a city, newest first upstream.
    async fn city_history(&self, city: &str, limit: usize)
        -> Result<Vec<CitySample>, ProviderError>;

    /// The city's current reading, `None` when the provider has no AQI for it.
    async fn city_snapshot(&self, city: &str) -> Result<Option<CitySample>, ProviderError>;
}

/// Text-completion backend for health advice.
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
