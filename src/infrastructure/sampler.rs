// Upstream sampler - SampleSource over the two provider clients
//
// Bulk history comes from OpenAQ; current per-city snapshots come from the
// WAQI city feed, which only ever reports "now".
use crate::application::providers::{ProviderError, SampleSource};
use crate::domain::chart::CitySample;
use crate::infrastructure::openaq::OpenAqClient;
use crate::infrastructure::waqi::WaqiClient;
use async_trait::async_trait;
use std::sync::Arc;

pub struct UpstreamSampler {
    waqi: Arc<WaqiClient>,
    openaq: Arc<OpenAqClient>,
}

impl UpstreamSampler {
    pub fn new(waqi: Arc<WaqiClient>, openaq: Arc<OpenAqClient>) -> Self {
        Self { waqi, openaq }
    }
}

#[async_trait]
impl SampleSource for UpstreamSampler {
    async fn city_history(
        &self,
        city: &str,
        limit: usize,
    ) -> Result<Vec<CitySample>, ProviderError> {
        self.openaq.city_history(city, limit).await
    }

    async fn city_snapshot(&self, city: &str) -> Result<Option<CitySample>, ProviderError> {
        self.waqi.city_snapshot(city).await
    }
}
