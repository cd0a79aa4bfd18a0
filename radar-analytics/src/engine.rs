use crate::anomaly::{self, Alert};
use crate::indicators::{self, IndicatorSet};
use crate::snapshot::{self, ChangeSnapshot};
use crate::tempo::{self, TempoReport};
use crate::timeline::{self, TimelineEvent};
use radar_core::config::ThresholdConfig;
use radar_core::{Result, TimeSeries};
use radar_data::{HistoryService, MarketSource};
use std::sync::Arc;

const INTERVAL: &str = "1h";
const SNAPSHOT_DAYS: u32 = 1;
const TEMPO_DAYS: u32 = 3;
const TIMELINE_DAYS: u32 = 1;
const INDICATOR_DAYS: u32 = 5;
/// Closes fed to the indicator engine; more history only refines the warmup.
const INDICATOR_WINDOW: usize = 100;

/// Orchestrates the four radar analytics over the cached history and the
/// live ticker. Carries no state of its own between calls; every method is
/// a fresh pass over its inputs.
pub struct RadarEngine {
    history: Arc<HistoryService>,
    source: Arc<MarketSource>,
    thresholds: Arc<ThresholdConfig>,
}

impl RadarEngine {
    pub fn new(
        history: Arc<HistoryService>,
        source: Arc<MarketSource>,
        thresholds: Arc<ThresholdConfig>,
    ) -> Self {
        Self {
            history,
            source,
            thresholds,
        }
    }

    pub async fn snapshot(&self, symbol: &str) -> Result<ChangeSnapshot> {
        let series = self
            .history
            .get_or_fetch(symbol, INTERVAL, SNAPSHOT_DAYS, false)
            .await?;
        let ticker = self.source.ticker_or_demo(symbol).await;
        let indicators = indicator_set(&series);
        snapshot::change_snapshot(&series, &ticker, &indicators)
    }

    pub async fn anomalies(&self, symbol: &str) -> Result<Vec<Alert>> {
        let series = self
            .history
            .get_or_fetch(symbol, INTERVAL, self.thresholds.volume.lookback_days, false)
            .await?;
        let ticker = self.source.ticker_or_demo(symbol).await;
        let indicators = indicator_set(&series);
        anomaly::detect_anomalies(&series, &ticker, &indicators, &self.thresholds)
    }

    pub async fn tempo(&self, symbol: &str) -> Result<TempoReport> {
        let series = self
            .history
            .get_or_fetch(symbol, INTERVAL, TEMPO_DAYS, false)
            .await?;
        tempo::measure_tempo(&series, &self.thresholds)
    }

    pub async fn timeline(&self, symbol: &str) -> Result<Vec<TimelineEvent>> {
        let series = self
            .history
            .get_or_fetch(symbol, INTERVAL, TIMELINE_DAYS, false)
            .await?;
        timeline::build_timeline(&series)
    }

    /// Indicator snapshot for an arbitrary interval, used by the market
    /// surface directly.
    pub async fn indicators(&self, symbol: &str, interval: &str) -> Result<IndicatorSet> {
        let series = self
            .history
            .get_or_fetch(symbol, interval, INDICATOR_DAYS, false)
            .await?;
        Ok(indicator_set(&series))
    }
}

fn indicator_set(series: &TimeSeries) -> IndicatorSet {
    let closes = series.closes();
    let tail = &closes[closes.len().saturating_sub(INDICATOR_WINDOW)..];
    indicators::compute(tail)
}
