// Application state for HTTP handlers
use crate::application::advice_service::AdviceService;
use crate::application::aggregation_service::AggregationService;
use crate::application::history_service::HistoryService;
use crate::application::live_gate::LiveReadingGate;
use crate::application::reading_repository::ReadingRepository;
use crate::domain::region::RegionTable;
use crate::infrastructure::geocoder::NominatimClient;
use std::sync::Arc;

pub struct AppState {
    pub history_service: HistoryService,
    pub aggregation_service: AggregationService,
    pub advice_service: AdviceService,
    pub live_gate: LiveReadingGate,
    pub geocoder: NominatimClient,
    pub regions: Arc<RegionTable>,
    pub repository: Arc<dyn ReadingRepository>,
}
