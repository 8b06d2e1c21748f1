// Aggregation - monthly rollups and regional/country averages with
// seasonal fallback generation
//
// Bulk-history providers are unreliable and rate-limited, so every
// aggregate has a floor on real coverage below which a deterministic
// seasonal-base-plus-bounded-noise series is served instead of a partial
// or empty one. The bands are policy constants tuned for plausibility,
// not a pollution model.
use crate::application::providers::SampleSource;
use crate::domain::chart::{ChartPoint, CitySample, SeriesPoint};
use crate::domain::region::RegionTable;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use futures::future::join_all;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Cities swept for country-level aggregates.
const COUNTRY_CITIES: &[&str] = &[
    "Delhi", "Mumbai", "Bangalore", "Hyderabad", "Chennai",
    "Kolkata", "Pune", "Ahmedabad", "Jaipur", "Lucknow",
    "Kanpur", "Nagpur", "Indore", "Thane", "Bhopal",
    "Visakhapatnam", "Patna", "Vadodara", "Ghaziabad", "Ludhiana",
];

/// Real-coverage floors below which the seasonal generator takes over.
const COUNTRY_DAILY_MIN_SAMPLES: usize = 10;
const COUNTRY_YEARLY_MIN_SAMPLES: usize = 50;
const STATE_YEARLY_MIN_MONTHS: usize = 6;

/// At most this many cities are snapshot per state-level request.
const STATE_CITY_LIMIT: usize = 3;

const COUNTRY_DAILY_HISTORY_LIMIT: usize = 200;
const COUNTRY_YEARLY_HISTORY_LIMIT: usize = 500;

/// Global average AQI baseline for world-level series.
const WORLD_BASE_AQI: f64 = 111.0;

/// Yearly global averages, ranges collapsed to midpoints.
const WORLD_YEARLY_AQI: &[(i32, i32)] = &[
    (2014, 35),
    (2015, 85),
    (2016, 90),
    (2017, 95),
    (2018, 100),
    (2019, 100),
    (2020, 95),
    (2021, 105),
    (2022, 105),
    (2023, 105),
    (2024, 111),
];

/// An aggregated series plus a label describing where it came from.
pub struct AggregatedSeries<P> {
    pub points: Vec<P>,
    pub source: String,
}

pub struct AggregationService {
    samples: Arc<dyn SampleSource>,
    regions: Arc<RegionTable>,
}

impl AggregationService {
    pub fn new(samples: Arc<dyn SampleSource>, regions: Arc<RegionTable>) -> Self {
        Self { samples, regions }
    }

    /// Daily country-level series: per-city sweeps averaged by date, or the
    /// seasonal generator when real coverage is too thin.
    pub async fn country_daily(&self, days: u32) -> AggregatedSeries<ChartPoint> {
        let (samples, cities_covered) = self
            .sweep_cities(COUNTRY_DAILY_HISTORY_LIMIT)
            .await;

        if samples.len() < COUNTRY_DAILY_MIN_SAMPLES {
            warn!(
                "only {} country samples from {} cities, serving seasonal series",
                samples.len(),
                cities_covered
            );
            return AggregatedSeries {
                points: country_seasonal_daily(days),
                source: "Seasonal model (insufficient upstream coverage)".to_string(),
            };
        }

        let mut points = average_by_date(&samples);
        if points.len() > days as usize {
            points.drain(..points.len() - days as usize);
        }

        AggregatedSeries {
            points,
            source: format!("Upstream measurements ({} cities)", cities_covered),
        }
    }

    /// Yearly country-level series: monthly averages over a deeper sweep,
    /// last 12 months, with the same coverage floor.
    pub async fn country_yearly(&self) -> AggregatedSeries<ChartPoint> {
        let (samples, cities_covered) = self
            .sweep_cities(COUNTRY_YEARLY_HISTORY_LIMIT)
            .await;

        if samples.len() < COUNTRY_YEARLY_MIN_SAMPLES {
            warn!(
                "only {} yearly country samples, serving seasonal series",
                samples.len()
            );
            return AggregatedSeries {
                points: country_seasonal_yearly(),
                source: "Seasonal model (insufficient upstream coverage)".to_string(),
            };
        }

        let daily: Vec<ChartPoint> = samples.iter().map(ChartPoint::from).collect();
        let mut monthly = monthly_rollup(&daily);
        if monthly.len() > 12 {
            monthly.drain(..monthly.len() - 12);
        }

        AggregatedSeries {
            points: monthly,
            source: format!("Upstream measurements ({} cities)", cities_covered),
        }
    }

    /// Yearly state-level series: monthly averages over the state's major
    /// cities, falling back to the seasonal generator when fewer than six
    /// months of aggregated data exist.
    pub async fn state_yearly(&self, state: &str) -> AggregatedSeries<SeriesPoint> {
        let cities = self.regions.major_cities(state);
        let cities = &cities[..cities.len().min(STATE_CITY_LIMIT)];

        let fetches = cities.iter().map(|city| self.samples.city_snapshot(city));
        let mut daily: Vec<ChartPoint> = Vec::new();
        for (city, result) in cities.iter().zip(join_all(fetches).await) {
            match result {
                Ok(Some(sample)) => daily.push(ChartPoint::from(&sample)),
                Ok(None) => {}
                Err(e) => warn!("snapshot failed for {}: {}", city, e),
            }
        }

        let monthly = monthly_rollup(&daily);
        if monthly.len() < STATE_YEARLY_MIN_MONTHS {
            info!(
                "{} months of aggregated data for {}, serving seasonal series",
                monthly.len(),
                state
            );
            return AggregatedSeries {
                points: state_seasonal_yearly(),
                source: "Seasonal model (insufficient upstream coverage)".to_string(),
            };
        }

        AggregatedSeries {
            points: monthly
                .into_iter()
                .map(|p| SeriesPoint { date: p.date, aqi: p.aqi })
                .collect(),
            source: format!("Upstream measurements ({} cities)", cities.len()),
        }
    }

    /// Daily world-level series around the fixed global baseline.
    pub fn world_daily(&self, days: u32) -> AggregatedSeries<ChartPoint> {
        AggregatedSeries {
            points: world_seasonal_daily(days),
            source: "Global baseline model".to_string(),
        }
    }

    /// Fixed yearly global averages.
    pub fn world_yearly(&self) -> AggregatedSeries<SeriesPoint> {
        let points = WORLD_YEARLY_AQI
            .iter()
            .map(|&(year, aqi)| SeriesPoint {
                date: NaiveDate::from_ymd_opt(year, 1, 1).expect("static year table"),
                aqi,
            })
            .collect();
        AggregatedSeries {
            points,
            source: "Global yearly averages".to_string(),
        }
    }

    async fn sweep_cities(&self, limit: usize) -> (Vec<CitySample>, usize) {
        let fetches = COUNTRY_CITIES
            .iter()
            .map(|city| self.samples.city_history(city, limit));

        let mut all = Vec::new();
        let mut covered = 0usize;
        for (city, result) in COUNTRY_CITIES.iter().zip(join_all(fetches).await) {
            match result {
                Ok(samples) if !samples.is_empty() => {
                    covered += 1;
                    all.extend(samples);
                }
                Ok(_) => {}
                Err(e) => warn!("history fetch failed for {}: {}", city, e),
            }
        }
        (all, covered)
    }
}

/// Group per-city samples by calendar date and average every numeric field
/// across the cities reporting that date. Ascending by date.
fn average_by_date(samples: &[CitySample]) -> Vec<ChartPoint> {
    let mut groups: BTreeMap<NaiveDate, Vec<&CitySample>> = BTreeMap::new();
    for sample in samples {
        groups.entry(sample.date).or_default().push(sample);
    }

    groups
        .into_iter()
        .map(|(date, group)| {
            let n = group.len() as f64;
            let mean = |f: fn(&CitySample) -> f64| -> i32 {
                (group.iter().map(|s| f(s)).sum::<f64>() / n).round() as i32
            };
            ChartPoint {
                date,
                aqi: mean(|s| f64::from(s.aqi)),
                pm25: mean(|s| s.pm25),
                pm10: mean(|s| s.pm10),
                o3: mean(|s| s.o3),
                no2: mean(|s| s.no2),
                co: mean(|s| s.co),
                so2: mean(|s| s.so2),
            }
        })
        .collect()
}

/// Group daily points by year-month and average every numeric field,
/// dating each result on the first of its month. Ascending by date.
pub fn monthly_rollup(daily: &[ChartPoint]) -> Vec<ChartPoint> {
    let mut groups: BTreeMap<(i32, u32), Vec<&ChartPoint>> = BTreeMap::new();
    for point in daily {
        groups
            .entry((point.date.year(), point.date.month()))
            .or_default()
            .push(point);
    }

    groups
        .into_iter()
        .map(|((year, month), group)| {
            let n = group.len() as f64;
            let mean = |f: fn(&ChartPoint) -> i32| -> i32 {
                (group.iter().map(|p| f64::from(f(p))).sum::<f64>() / n).round() as i32
            };
            ChartPoint {
                date: NaiveDate::from_ymd_opt(year, month, 1).expect("month from a valid date"),
                aqi: mean(|p| p.aqi),
                pm25: mean(|p| p.pm25),
                pm10: mean(|p| p.pm10),
                o3: mean(|p| p.o3),
                no2: mean(|p| p.no2),
                co: mean(|p| p.co),
                so2: mean(|p| p.so2),
            }
        })
        .collect()
}

/// Fill the gas fields every generated point carries.
fn generated_point(date: NaiveDate, aqi: i32) -> ChartPoint {
    let mut rng = rand::thread_rng();
    ChartPoint {
        date,
        aqi,
        pm25: (f64::from(aqi) * 0.8).round() as i32,
        pm10: (f64::from(aqi) * 1.2).round() as i32,
        o3: (30.0_f64 + rng.gen_range(0.0..40.0)).round() as i32,
        no2: (20.0_f64 + rng.gen_range(0.0..30.0)).round() as i32,
        co: (1.0_f64 + rng.gen_range(0.0..5.0)).round() as i32,
        so2: (5.0_f64 + rng.gen_range(0.0..15.0)).round() as i32,
    }
}

/// India runs higher in winter and post-monsoon; the daily generator
/// follows that seasonal shape.
fn country_seasonal_daily(days: u32) -> Vec<ChartPoint> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let mut points = Vec::with_capacity(days as usize);

    for offset in 0..days {
        let date = today - Duration::days(i64::from(offset));
        let base = match date.month() {
            10 | 11 | 12 | 1 | 2 => 120.0_f64 + rng.gen_range(-20.0..40.0),
            3 | 4 | 5 => 80.0_f64 + rng.gen_range(-15.0..30.0),
            _ => 60.0_f64 + rng.gen_range(-10.0..25.0),
        };
        let aqi = (base + rng.gen_range(-15.0..15.0)).clamp(30.0, 300.0).round() as i32;
        points.push(generated_point(date, aqi));
    }

    points.reverse();
    points
}

fn country_seasonal_yearly() -> Vec<ChartPoint> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let mut points = Vec::with_capacity(12);

    for offset in 0..12 {
        let date = today - Duration::days(offset * 30);
        let base = match date.month() {
            10 | 11 | 12 | 1 | 2 => 140.0_f64 + rng.gen_range(-30.0..50.0),
            3 | 4 | 5 => 100.0_f64 + rng.gen_range(-20.0..40.0),
            _ => 80.0_f64 + rng.gen_range(-15.0..30.0),
        };
        let aqi = (base + rng.gen_range(-20.0..20.0)).clamp(40.0, 300.0).round() as i32;
        let month_start =
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("valid month");
        points.push(generated_point(month_start, aqi));
    }

    points.reverse();
    points
}

fn state_seasonal_yearly() -> Vec<SeriesPoint> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let mut points = Vec::with_capacity(12);

    for months_back in (1..=12).rev() {
        let date = today - Duration::days(months_back * 30);
        let base = match date.month() {
            3..=5 => 110,
            6..=8 => 70,
            11 | 12 | 1 | 2 => 130,
            _ => 90,
        };
        let aqi = (base + rng.gen_range(-20..=20)).clamp(25, 280);
        points.push(SeriesPoint {
            date: NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("valid month"),
            aqi,
        });
    }

    points
}

fn world_seasonal_daily(days: u32) -> Vec<ChartPoint> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let mut points = Vec::with_capacity(days as usize);

    for offset in 0..days {
        let date = today - Duration::days(i64::from(offset));
        let aqi = (WORLD_BASE_AQI + rng.gen_range(-15.0..15.0))
            .clamp(20.0, 200.0)
            .round() as i32;
        points.push(generated_point(date, aqi));
    }

    points.reverse();
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::providers::{ProviderError, SampleSource};
    use async_trait::async_trait;

    struct FakeSamples {
        history: Vec<CitySample>,
        snapshot_aqi: Option<i32>,
    }

    fn sample(city: &str, date: NaiveDate, aqi: i32) -> CitySample {
        CitySample {
            city: city.to_string(),
            date,
            aqi,
            pm25: f64::from(aqi) * 0.8,
            pm10: f64::from(aqi) * 1.2,
            o3: 30.0,
            no2: 20.0,
            co: 1.0,
            so2: 5.0,
        }
    }

    #[async_trait]
    impl SampleSource for FakeSamples {
        async fn city_history(
            &self,
            city: &str,
            _limit: usize,
        ) -> Result<Vec<CitySample>, ProviderError> {
            // Attribute the canned history to the first city only.
            if city == COUNTRY_CITIES[0] {
                Ok(self.history.clone())
            } else {
                Ok(Vec::new())
            }
        }

        async fn city_snapshot(&self, city: &str) -> Result<Option<CitySample>, ProviderError> {
            Ok(self
                .snapshot_aqi
                .map(|aqi| sample(city, Utc::now().date_naive(), aqi)))
        }
    }

    fn service(history: Vec<CitySample>, snapshot_aqi: Option<i32>) -> AggregationService {
        AggregationService::new(
            Arc::new(FakeSamples { history, snapshot_aqi }),
            Arc::new(RegionTable::new()),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_rollup_averages_one_month() {
        let daily = vec![
            ChartPoint { date: date(2024, 5, 3), aqi: 100, pm25: 80, pm10: 120, o3: 30, no2: 20, co: 1, so2: 5 },
            ChartPoint { date: date(2024, 5, 14), aqi: 110, pm25: 88, pm10: 132, o3: 30, no2: 20, co: 1, so2: 5 },
            ChartPoint { date: date(2024, 5, 25), aqi: 120, pm25: 96, pm10: 144, o3: 30, no2: 20, co: 1, so2: 5 },
        ];

        let monthly = monthly_rollup(&daily);

        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].date, date(2024, 5, 1));
        assert_eq!(monthly[0].aqi, 110);
        assert_eq!(monthly[0].pm25, 88);
    }

    #[test]
    fn test_monthly_rollup_sorts_months_ascending() {
        let daily = vec![
            ChartPoint { date: date(2024, 6, 1), aqi: 60, pm25: 48, pm10: 72, o3: 30, no2: 20, co: 1, so2: 5 },
            ChartPoint { date: date(2024, 4, 1), aqi: 40, pm25: 32, pm10: 48, o3: 30, no2: 20, co: 1, so2: 5 },
        ];

        let monthly = monthly_rollup(&daily);

        assert_eq!(monthly[0].date, date(2024, 4, 1));
        assert_eq!(monthly[1].date, date(2024, 6, 1));
    }

    #[test]
    fn test_average_by_date_groups_cities() {
        let d = date(2024, 5, 1);
        let samples = vec![sample("Delhi", d, 100), sample("Mumbai", d, 120)];

        let points = average_by_date(&samples);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].aqi, 110);
    }

    #[tokio::test]
    async fn test_country_daily_falls_back_below_sample_floor() {
        let today = Utc::now().date_naive();
        let thin: Vec<CitySample> = (0..5)
            .map(|i| sample("Delhi", today - Duration::days(i), 100))
            .collect();

        let series = service(thin, None).country_daily(30).await;

        assert_eq!(series.points.len(), 30);
        assert!(series.source.contains("Seasonal"));
        for point in &series.points {
            assert!((30..=300).contains(&point.aqi));
        }
    }

    #[tokio::test]
    async fn test_country_daily_uses_real_data_above_floor() {
        let today = Utc::now().date_naive();
        let rich: Vec<CitySample> = (0..15)
            .map(|i| sample("Delhi", today - Duration::days(i), 100 + i as i32))
            .collect();

        let series = service(rich, None).country_daily(30).await;

        assert_eq!(series.points.len(), 15);
        assert!(series.source.contains("Upstream"));
        // Ascending dates
        for pair in series.points.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[tokio::test]
    async fn test_country_daily_truncates_to_requested_days() {
        let today = Utc::now().date_naive();
        let rich: Vec<CitySample> = (0..40)
            .map(|i| sample("Delhi", today - Duration::days(i), 100))
            .collect();

        let series = service(rich, None).country_daily(30).await;

        assert_eq!(series.points.len(), 30);
        assert_eq!(series.points.last().unwrap().date, today);
    }

    #[tokio::test]
    async fn test_state_yearly_falls_back_without_coverage() {
        let series = service(Vec::new(), Some(95)).state_yearly("Maharashtra").await;

        // Three snapshots land in at most two distinct months, far below
        // the six-month floor.
        assert_eq!(series.points.len(), 12);
        assert!(series.source.contains("Seasonal"));
        for point in &series.points {
            assert_eq!(point.date.day(), 1);
            assert!((25..=280).contains(&point.aqi));
        }
        for pair in series.points.windows(2) {
            assert!(pair[0].date <= pair[1].date);
        }
    }

    #[tokio::test]
    async fn test_state_yearly_unknown_state_still_serves_series() {
        let series = service(Vec::new(), Some(95)).state_yearly("Atlantis").await;
        assert_eq!(series.points.len(), 12);
    }

    #[test]
    fn test_world_yearly_is_fixed_table() {
        let regions = Arc::new(RegionTable::new());
        let service = AggregationService::new(
            Arc::new(FakeSamples { history: Vec::new(), snapshot_aqi: None }),
            regions,
        );

        let series = service.world_yearly();

        assert_eq!(series.points.len(), 11);
        assert_eq!(series.points[0].date, date(2014, 1, 1));
        assert_eq!(series.points[0].aqi, 35);
        assert_eq!(series.points.last().unwrap().aqi, 111);
    }

    #[test]
    fn test_world_daily_stays_in_band() {
        let regions = Arc::new(RegionTable::new());
        let service = AggregationService::new(
            Arc::new(FakeSamples { history: Vec::new(), snapshot_aqi: None }),
            regions,
        );

        let series = service.world_daily(30);

        assert_eq!(series.points.len(), 30);
        for point in &series.points {
            assert!((20..=200).contains(&point.aqi));
        }
    }
}
