use radar_analytics::RadarEngine;
use radar_data::{HistoryService, MarketSource};
use std::sync::Arc;
use std::time::Duration;

/// Shared handles for the HTTP and WebSocket surfaces. Everything here is
/// constructed once at startup and passed by reference-counted handle.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RadarEngine>,
    pub history: Arc<HistoryService>,
    pub source: Arc<MarketSource>,
    pub broadcast_interval: Duration,
}

impl AppState {
    pub fn new(
        engine: Arc<RadarEngine>,
        history: Arc<HistoryService>,
        source: Arc<MarketSource>,
        broadcast_interval: Duration,
    ) -> Self {
        Self {
            engine,
            history,
            source,
            broadcast_interval,
        }
    }
}
