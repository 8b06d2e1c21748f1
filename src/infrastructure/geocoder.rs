// Nominatim geocoding pass-throughs for the frontend search box
use crate::application::providers::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("airwatch/", env!("CARGO_PKG_VERSION"));
const SUGGESTION_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub place_id: Option<i64>,
    pub display_name: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    #[serde(default)]
    pub address: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub place_id: Option<i64>,
    pub display_name: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    #[serde(default)]
    pub address: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl NominatimClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Search suggestions for a partial place name, biased to India,
    /// best matches first.
    pub async fn suggest(&self, query: &str) -> Result<Vec<PlaceSuggestion>, ProviderError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", "10"),
                ("addressdetails", "1"),
                ("countrycodes", "in"),
                ("accept-language", "en"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let mut suggestions = response.json::<Vec<PlaceSuggestion>>().await?;
        debug!("{} suggestions for '{}'", suggestions.len(), query);

        suggestions.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        suggestions.truncate(SUGGESTION_LIMIT);
        Ok(suggestions)
    }

    /// Reverse-geocode coordinates to a place description.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<PlaceInfo, ProviderError> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("accept-language", "en".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<PlaceInfo>().await?)
    }
}

impl Default for NominatimClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suggestions_deserialize_and_sort() {
        let mut suggestions: Vec<PlaceSuggestion> = serde_json::from_value(json!([
            {"place_id": 1, "display_name": "A", "lat": "1", "lon": "2", "type": "city", "importance": 0.3},
            {"place_id": 2, "display_name": "B", "lat": "3", "lon": "4", "type": "village", "importance": 0.9}
        ]))
        .unwrap();

        suggestions.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap());
        assert_eq!(suggestions[0].place_id, Some(2));
    }
}
