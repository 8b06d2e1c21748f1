// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::advice_service::AdviceService;
use crate::application::aggregation_service::AggregationService;
use crate::application::history_service::HistoryService;
use crate::application::live_gate::LiveReadingGate;
use crate::application::providers::{AdviceGenerator, AqiProvider, SampleSource};
use crate::application::reading_repository::ReadingRepository;
use crate::domain::region::RegionTable;
use crate::infrastructure::config::load_service_config;
use crate::infrastructure::gemini::GeminiClient;
use crate::infrastructure::geocoder::NominatimClient;
use crate::infrastructure::openaq::OpenAqClient;
use crate::infrastructure::postgres_repository::PostgresReadingRepository;
use crate::infrastructure::sampler::UpstreamSampler;
use crate::infrastructure::waqi::WaqiClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chart_data, clear_all_data, clear_location_data, fetch_live_aqi, generate_advice,
    health_check, reverse_geocode, suggest_locations, yearly_chart_data,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_service_config()?;

    // Create repository (infrastructure layer); the store is allowed to be
    // down, the service degrades to in-memory synthesis.
    let postgres = Arc::new(PostgresReadingRepository::new(&config.database.url)?);
    if let Err(e) = postgres.init_schema().await {
        tracing::error!("schema init failed, store degraded: {:#}", e);
    }
    let repository: Arc<dyn ReadingRepository> = postgres;

    // Upstream clients
    let waqi = Arc::new(WaqiClient::new(config.providers.waqi_token.clone()));
    let openaq = Arc::new(OpenAqClient::new());
    let regions = Arc::new(RegionTable::new());

    // Create services (application layer)
    let primary: Arc<dyn AqiProvider> = waqi.clone();
    let secondary: Arc<dyn AqiProvider> = openaq.clone();
    let live_gate = LiveReadingGate::new(
        primary,
        secondary,
        Duration::from_secs(config.cache.ttl_secs),
        config.cache.capacity,
    );
    let sampler: Arc<dyn SampleSource> = Arc::new(UpstreamSampler::new(waqi, openaq));
    let generator: Arc<dyn AdviceGenerator> =
        Arc::new(GeminiClient::new(config.providers.gemini_key.clone()));
    let history_service = HistoryService::new(repository.clone());
    let aggregation_service = AggregationService::new(sampler, regions.clone());
    let advice_service = AdviceService::new(generator);

    // Create application state
    let state = Arc::new(AppState {
        history_service,
        aggregation_service,
        advice_service,
        live_gate,
        geocoder: NominatimClient::new(),
        regions,
        repository,
    });

    // CORS for the SPA frontend
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/aqi", post(fetch_live_aqi))
        .route("/charts/:level", get(chart_data))
        .route("/charts/:level/yearly", get(yearly_chart_data))
        .route("/clear-data", delete(clear_all_data))
        .route("/clear-location-data", delete(clear_location_data))
        .route("/advice", post(generate_advice))
        .route("/locations/suggest", get(suggest_locations))
        .route("/locations/reverse", get(reverse_geocode))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    println!("Starting airwatch service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
