// WAQI client - primary live AQI provider
//
// The feed's `aqi` field arrives as a number or as the string "N/A", so
// parsing stays tolerant and an unusable AQI becomes `None` rather than
// an error.
use crate::application::providers::{AqiProvider, ProviderError};
use crate::domain::chart::CitySample;
use crate::domain::reading::{LiveSnapshot, Pollutants};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://api.waqi.info";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(7);

#[derive(Debug, Clone)]
pub struct WaqiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct WaqiFeed {
    status: String,
    data: Option<WaqiData>,
}

#[derive(Debug, Deserialize)]
struct WaqiData {
    #[serde(default)]
    aqi: Option<serde_json::Value>,
    #[serde(default)]
    city: Option<WaqiCity>,
    #[serde(default)]
    dominentpol: Option<String>,
    #[serde(default)]
    iaqi: Option<HashMap<String, WaqiValue>>,
}

#[derive(Debug, Deserialize)]
struct WaqiCity {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaqiValue {
    v: f64,
}

impl WaqiClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            token,
        }
    }

    async fn fetch_feed(&self, path: &str) -> Result<WaqiFeed, ProviderError> {
        let url = format!("{}/feed/{}/?token={}", self.base_url, path, self.token);
        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<WaqiFeed>().await?)
    }

    /// Live snapshot for a coordinate pair.
    pub async fn geo_feed(&self, lat: f64, lon: f64) -> Result<LiveSnapshot, ProviderError> {
        let feed = self.fetch_feed(&format!("geo:{};{}", lat, lon)).await?;
        snapshot_from_feed(feed)
    }

    /// The city's current reading as a sample dated today, `None` when the
    /// station reports no usable AQI.
    pub async fn city_snapshot(&self, city: &str) -> Result<Option<CitySample>, ProviderError> {
        let feed = self.fetch_feed(urlencoding::encode(city).as_ref()).await?;
        let snapshot = snapshot_from_feed(feed)?;
        debug!("WAQI city feed for {}: aqi={:?}", city, snapshot.aqi);

        Ok(snapshot.aqi.map(|aqi| {
            let p = &snapshot.pollutants;
            CitySample {
                city: city.to_string(),
                date: Utc::now().date_naive(),
                aqi,
                pm25: p.pm25.unwrap_or(0.0),
                pm10: p.pm10.unwrap_or(0.0),
                o3: p.o3.unwrap_or(0.0),
                no2: p.no2.unwrap_or(0.0),
                co: p.co.unwrap_or(0.0),
                so2: p.so2.unwrap_or(0.0),
            }
        }))
    }
}

fn snapshot_from_feed(feed: WaqiFeed) -> Result<LiveSnapshot, ProviderError> {
    if feed.status != "ok" {
        return Err(ProviderError::Payload(format!(
            "WAQI status {}",
            feed.status
        )));
    }
    let data = feed.data.ok_or(ProviderError::NoData)?;

    let aqi = data.aqi.as_ref().and_then(parse_aqi);
    let iaqi = data.iaqi.unwrap_or_default();
    let value_of = |key: &str| iaqi.get(key).map(|v| v.v);

    Ok(LiveSnapshot {
        aqi,
        city: data
            .city
            .and_then(|c| c.name)
            .unwrap_or_else(|| "Unknown".to_string()),
        dominant: data.dominentpol.unwrap_or_else(|| "N/A".to_string()),
        pollutants: Pollutants {
            pm25: value_of("pm25"),
            pm10: value_of("pm10"),
            o3: value_of("o3"),
            no2: value_of("no2"),
            co: value_of("co"),
            so2: value_of("so2"),
        },
    })
}

fn parse_aqi(value: &serde_json::Value) -> Option<i32> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f.round() as i32),
        serde_json::Value::String(s) => s.parse::<i32>().ok(),
        _ => None,
    }
}

#[async_trait]
impl AqiProvider for WaqiClient {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<LiveSnapshot, ProviderError> {
        self.geo_feed(lat, lon).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed(value: serde_json::Value) -> WaqiFeed {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parses_numeric_aqi_and_pollutants() {
        let snapshot = snapshot_from_feed(feed(json!({
            "status": "ok",
            "data": {
                "aqi": 152,
                "city": {"name": "Mumbai"},
                "dominentpol": "pm25",
                "iaqi": {"pm25": {"v": 57.2}, "pm10": {"v": 88.0}, "o3": {"v": 12.1}}
            }
        })))
        .unwrap();

        assert_eq!(snapshot.aqi, Some(152));
        assert_eq!(snapshot.city, "Mumbai");
        assert_eq!(snapshot.dominant, "pm25");
        assert_eq!(snapshot.pollutants.pm25, Some(57.2));
        assert_eq!(snapshot.pollutants.no2, None);
    }

    #[test]
    fn test_string_aqi_becomes_none() {
        let snapshot = snapshot_from_feed(feed(json!({
            "status": "ok",
            "data": {"aqi": "N/A", "city": {"name": "Nowhere"}}
        })))
        .unwrap();
        assert_eq!(snapshot.aqi, None);
    }

    #[test]
    fn test_numeric_string_aqi_is_parsed() {
        let snapshot = snapshot_from_feed(feed(json!({
            "status": "ok",
            "data": {"aqi": "97"}
        })))
        .unwrap();
        assert_eq!(snapshot.aqi, Some(97));
        assert_eq!(snapshot.city, "Unknown");
    }

    #[test]
    fn test_error_status_is_rejected() {
        let result = snapshot_from_feed(feed(json!({
            "status": "error",
            "data": null
        })));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_data_is_no_data() {
        let result = snapshot_from_feed(feed(json!({"status": "ok"})));
        assert!(matches!(result, Err(ProviderError::NoData)));
    }
}
