// HTTP request handlers
use crate::application::advice_service::AdviceRequest;
use crate::domain::chart::SeriesPoint;
use crate::domain::reading::{Reading, ReadingOrigin, Scope, Series};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

const DEFAULT_CHART_DAYS: u32 = 30;

/// Frontend-supplied AQI values outside this band are ignored.
const FRONTEND_AQI_MAX: i32 = 2000;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),

    #[error("internal error")]
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            tracing::error!("internal error: {:#}", e);
        }
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({"status": "error", "message": self.to_string()}));
        (status, body).into_response()
    }
}

#[derive(Deserialize)]
pub struct LocationBody {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub days: Option<u32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub state: Option<String>,
    pub aqi: Option<i32>,
}

#[derive(Deserialize)]
pub struct YearlyQuery {
    pub state: Option<String>,
}

#[derive(Deserialize)]
pub struct CoordsQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
pub struct SuggestQuery {
    pub q: String,
}

fn validate_coords(lat: f64, lon: f64) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::BadRequest(
            "invalid latitude, must be between -90 and 90".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::BadRequest(
            "invalid longitude, must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

fn series_points(series: &Series) -> Vec<SeriesPoint> {
    series
        .iter()
        .map(|r| SeriesPoint { date: r.date, aqi: r.aqi })
        .collect()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Live AQI lookup for a coordinate pair, persisted for today when new.
///
/// This is the one endpoint where provider exhaustion is an error; the
/// chart paths fall back to synthesis instead.
pub async fn fetch_live_aqi(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LocationBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_coords(body.lat, body.lon)?;

    let snapshot = state
        .live_gate
        .get(body.lat, body.lon)
        .await
        .ok_or_else(|| ApiError::Upstream("failed to fetch AQI from all sources".to_string()))?;

    let region = state.regions.resolve(&snapshot.city);

    // Best-effort persistence: the reading also feeds the state-level
    // history when the reporting city resolves to one.
    if let Some(reading) = snapshot.to_reading(Utc::now().date_naive()) {
        let mut scopes = vec![Scope::location(body.lat, body.lon)];
        if let Some(region) = region {
            scopes.push(Scope::region(region));
        }
        for scope in scopes {
            if let Err(e) = state.repository.insert_if_absent(&scope, &reading).await {
                warn!("failed to store live reading for {}: {:#}", scope.key(), e);
            }
        }
    }

    let p = &snapshot.pollutants;
    Ok(Json(json!({
        "aqi": snapshot.aqi,
        "city": snapshot.city,
        "state": region,
        "dominant": snapshot.dominant,
        "pm25": p.pm25,
        "pm10": p.pm10,
        "o3": p.o3,
        "no2": p.no2,
        "co": p.co,
        "so2": p.so2,
    })))
}

/// Daily chart series for a location, state, the country or the world.
pub async fn chart_data(
    Path(level): Path<String>,
    Query(query): Query<ChartQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_CHART_DAYS);

    match level.as_str() {
        "location" => {
            let (lat, lon) = match (query.lat, query.lon) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    return Err(ApiError::BadRequest(
                        "lat and lon are required for location level".to_string(),
                    ))
                }
            };
            validate_coords(lat, lon)?;

            let today = Utc::now().date_naive();
            let live = match query.aqi {
                // A plausible frontend-supplied AQI saves the upstream call.
                Some(aqi) if aqi > 0 && aqi < FRONTEND_AQI_MAX => {
                    Some(Reading::new(today, aqi, None, ReadingOrigin::Live))
                }
                _ => state
                    .live_gate
                    .get(lat, lon)
                    .await
                    .and_then(|s| s.to_reading(today)),
            };

            let series = state
                .history_service
                .build_series(&Scope::location(lat, lon), days, live)
                .await;

            Ok(Json(json!({
                "status": "ok",
                "level": "location",
                "days": days,
                "data": series_points(&series),
                "source": "Stored history with synthesis",
            })))
        }
        "state" => {
            let region = match query.state {
                Some(ref name) if !name.trim().is_empty() => Some(name.trim().to_string()),
                _ => match (query.lat, query.lon) {
                    // Derive the state from the live reading's city.
                    (Some(lat), Some(lon)) => state
                        .live_gate
                        .get(lat, lon)
                        .await
                        .and_then(|s| state.regions.resolve(&s.city))
                        .map(str::to_string),
                    _ => None,
                },
            };
            let region = region.ok_or_else(|| {
                ApiError::BadRequest("a 'state' parameter is required for state-level data".to_string())
            })?;

            let series = state
                .history_service
                .build_series(&Scope::region(region.clone()), days, None)
                .await;

            Ok(Json(json!({
                "status": "ok",
                "level": "state",
                "state": region,
                "days": days,
                "data": series_points(&series),
                "source": "Stored history with synthesis",
            })))
        }
        "country" => {
            let series = state.aggregation_service.country_daily(days).await;
            Ok(Json(json!({
                "status": "ok",
                "level": "country",
                "days": days,
                "data": series.points,
                "source": series.source,
            })))
        }
        "world" => {
            let series = state.aggregation_service.world_daily(days);
            Ok(Json(json!({
                "status": "ok",
                "level": "world",
                "days": days,
                "data": series.points,
                "source": series.source,
            })))
        }
        other => Err(ApiError::BadRequest(format!(
            "invalid or unsupported level: {}",
            other
        ))),
    }
}

/// Last-12-months view, aggregated monthly.
pub async fn yearly_chart_data(
    Path(level): Path<String>,
    Query(query): Query<YearlyQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match level.as_str() {
        "country" => {
            let series = state.aggregation_service.country_yearly().await;
            Ok(Json(json!({
                "status": "ok",
                "data": series.points,
                "source": series.source,
            })))
        }
        "world" => {
            let series = state.aggregation_service.world_yearly();
            Ok(Json(json!({
                "status": "ok",
                "data": series.points,
                "source": series.source,
            })))
        }
        "state" => {
            let region = query.state.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
                ApiError::BadRequest(
                    "the 'state' query parameter is required for state-level yearly data".to_string(),
                )
            })?;
            let series = state.aggregation_service.state_yearly(&region).await;
            Ok(Json(json!({
                "status": "ok",
                "state": region,
                "data": series.points,
                "source": series.source,
            })))
        }
        other => Err(ApiError::NotFound(format!(
            "yearly data not available for level '{}', available levels: country, world, state",
            other
        ))),
    }
}

/// Clear every stored reading.
pub async fn clear_all_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state
        .repository
        .delete_all()
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({"status": "ok", "deleted_count": deleted})))
}

/// Clear the stored readings for one location.
pub async fn clear_location_data(
    Query(query): Query<CoordsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_coords(query.lat, query.lon)?;
    let deleted = state
        .repository
        .delete_scope(&Scope::location(query.lat, query.lon))
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({"status": "ok", "deleted_count": deleted})))
}

/// Health advice from symptoms and an AQI value.
pub async fn generate_advice(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdviceRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let advice = state
        .advice_service
        .advise(&request)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Json(json!({"suggestion": advice})))
}

/// Location search suggestions; upstream failures degrade to an empty list.
pub async fn suggest_locations(
    Query(query): Query<SuggestQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    if query.q.trim().len() < 2 {
        return Json(json!([]));
    }
    match state.geocoder.suggest(query.q.trim()).await {
        Ok(suggestions) => Json(json!(suggestions)),
        Err(e) => {
            warn!("suggestion lookup failed for '{}': {}", query.q, e);
            Json(json!([]))
        }
    }
}

/// Reverse-geocode coordinates to a place description.
pub async fn reverse_geocode(
    Query(query): Query<CoordsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_coords(query.lat, query.lon)?;
    let place = state
        .geocoder
        .reverse(query.lat, query.lon)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Json(json!(place)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(validate_coords(19.0, 72.8).is_ok());
        assert!(validate_coords(-90.0, 180.0).is_ok());
        assert!(validate_coords(90.5, 0.0).is_err());
        assert!(validate_coords(0.0, -180.5).is_err());
    }

    #[test]
    fn test_api_error_status_codes() {
        let bad = ApiError::BadRequest("nope".to_string()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing = ApiError::NotFound("gone".to_string()).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let upstream = ApiError::Upstream("down".to_string()).into_response();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }
}
