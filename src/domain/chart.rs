// Chart data domain models
use chrono::NaiveDate;
use serde::Serialize;

/// One raw upstream sample for one city and day. Pollutant concentrations
/// stay fractional until aggregation rounds them.
#[derive(Debug, Clone)]
pub struct CitySample {
    pub city: String,
    pub date: NaiveDate,
    pub aqi: i32,
    pub pm25: f64,
    pub pm10: f64,
    pub o3: f64,
    pub no2: f64,
    pub co: f64,
    pub so2: f64,
}

/// One aggregated chart point with the full pollutant breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub aqi: i32,
    pub pm25: i32,
    pub pm10: i32,
    pub o3: i32,
    pub no2: i32,
    pub co: i32,
    pub so2: i32,
}

/// Minimal chart point for AQI-only series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub aqi: i32,
}

impl From<&CitySample> for ChartPoint {
    fn from(sample: &CitySample) -> Self {
        ChartPoint {
            date: sample.date,
            aqi: sample.aqi,
            pm25: sample.pm25.round() as i32,
            pm10: sample.pm10.round() as i32,
            o3: sample.o3.round() as i32,
            no2: sample.no2.round() as i32,
            co: sample.co.round() as i32,
            so2: sample.so2.round() as i32,
        }
    }
}
