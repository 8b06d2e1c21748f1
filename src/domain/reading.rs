// Reading domain models - one AQI value per calendar day at one scope
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Coordinates are rounded to this many decimal places before they become a
/// storage identity, so nearby fixes collapse onto one scope.
const COORD_PRECISION: i32 = 4;

/// AQI values outside this band are clamped rather than rejected.
const AQI_MIN: i32 = 0;
const AQI_MAX: i32 = 500;

fn round_coord(value: f64) -> f64 {
    let factor = 10f64.powi(COORD_PRECISION);
    (value * factor).round() / factor
}

/// The identity axis a series is keyed by: a coordinate pair or a named region.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Location { lat: f64, lon: f64 },
    Region(String),
}

impl Scope {
    pub fn location(lat: f64, lon: f64) -> Self {
        Scope::Location {
            lat: round_coord(lat),
            lon: round_coord(lon),
        }
    }

    pub fn region(name: impl Into<String>) -> Self {
        Scope::Region(name.into())
    }

    /// Canonical storage key for this scope.
    pub fn key(&self) -> String {
        match self {
            Scope::Location { lat, lon } => format!("loc:{:.4}:{:.4}", lat, lon),
            Scope::Region(name) => format!("region:{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingOrigin {
    #[serde(rename = "live")]
    Live,
    #[serde(rename = "stored-real")]
    StoredReal,
    #[serde(rename = "synthetic")]
    Synthetic,
}

impl ReadingOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingOrigin::Live => "live",
            ReadingOrigin::StoredReal => "stored-real",
            ReadingOrigin::Synthetic => "synthetic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "live" => Some(ReadingOrigin::Live),
            "stored-real" => Some(ReadingOrigin::StoredReal),
            "synthetic" => Some(ReadingOrigin::Synthetic),
            _ => None,
        }
    }
}

/// Per-pollutant concentrations as reported upstream. Providers report
/// partial sets, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
}

/// One measurement or filler value for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub date: NaiveDate,
    pub aqi: i32,
    pub pollutants: Option<Pollutants>,
    pub origin: ReadingOrigin,
}

impl Reading {
    pub fn new(
        date: NaiveDate,
        aqi: i32,
        pollutants: Option<Pollutants>,
        origin: ReadingOrigin,
    ) -> Self {
        Self {
            date,
            aqi: aqi.clamp(AQI_MIN, AQI_MAX),
            pollutants,
            origin,
        }
    }

    pub fn synthetic(date: NaiveDate, aqi: i32) -> Self {
        Self::new(date, aqi, None, ReadingOrigin::Synthetic)
    }
}

/// Chronologically ordered, gap-free sequence of readings for one scope.
pub type Series = Vec<Reading>;

/// What a live fetch yields: the upstream AQI may be missing ("N/A"), the
/// rest describes the reporting station.
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    pub aqi: Option<i32>,
    pub city: String,
    pub dominant: String,
    pub pollutants: Pollutants,
}

impl LiveSnapshot {
    /// Today's reading from this snapshot, if the upstream AQI was numeric.
    pub fn to_reading(&self, date: NaiveDate) -> Option<Reading> {
        self.aqi.map(|aqi| {
            Reading::new(
                date,
                aqi,
                Some(self.pollutants.clone()),
                ReadingOrigin::Live,
            )
        })
    }
}
