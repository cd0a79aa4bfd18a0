use crate::state::AppState;
use crate::{AnomaliesResponse, ApiResult, TimelineResponse};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use radar_analytics::{ChangeSnapshot, IndicatorSet, TempoReport};
use radar_core::{OrderBookDepth, Ticker};
use radar_data::source::interval_ms;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cache": state.history.cache_stats(),
        "timestamp": Utc::now(),
    }))
}

pub async fn snapshot(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<ChangeSnapshot> {
    Ok(Json(state.engine.snapshot(&symbol).await?))
}

pub async fn anomalies(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<AnomaliesResponse> {
    let alerts = state.engine.anomalies(&symbol).await?;
    Ok(Json(AnomaliesResponse::new(alerts)))
}

pub async fn tempo(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<TempoReport> {
    Ok(Json(state.engine.tempo(&symbol).await?))
}

pub async fn timeline(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<TimelineResponse> {
    let events = state.engine.timeline(&symbol).await?;
    Ok(Json(TimelineResponse::new(events)))
}

pub async fn market(Path(symbol): Path<String>, State(state): State<AppState>) -> Json<Ticker> {
    Json(state.source.ticker_or_demo(&symbol).await)
}

#[derive(Debug, Deserialize)]
pub struct IndicatorsQuery {
    #[serde(default = "default_interval")]
    pub interval: String,
}

#[derive(Debug, Serialize)]
pub struct IndicatorsResponse {
    pub symbol: String,
    pub interval: String,
    #[serde(flatten)]
    pub indicators: IndicatorSet,
    pub timestamp: DateTime<Utc>,
}

pub async fn indicators(
    Path(symbol): Path<String>,
    Query(query): Query<IndicatorsQuery>,
    State(state): State<AppState>,
) -> ApiResult<IndicatorsResponse> {
    let symbol = symbol.to_uppercase();
    let indicators = state.engine.indicators(&symbol, &query.interval).await?;
    Ok(Json(IndicatorsResponse {
        symbol,
        interval: query.interval,
        indicators,
        timestamp: Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct OrderBookQuery {
    #[serde(default = "default_depth_limit")]
    pub limit: u32,
}

pub async fn orderbook(
    Path(symbol): Path<String>,
    Query(query): Query<OrderBookQuery>,
    State(state): State<AppState>,
) -> ApiResult<OrderBookDepth> {
    Ok(Json(state.source.fetch_depth(&symbol, query.limit).await?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoricalCandle {
    /// Candle open time in Unix milliseconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Most-recent `limit` candles for a symbol/interval, oldest first.
pub async fn history(
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> ApiResult<Vec<HistoricalCandle>> {
    let limit = query.limit.min(1000);

    // Window size needed to cover `limit` candles of this interval.
    let step_ms = interval_ms(&query.interval).unwrap_or(3_600_000);
    let hours_needed = limit as i64 * step_ms / 3_600_000;
    let days_needed = (hours_needed / 24 + 1).max(1) as u32;

    let series = state
        .history
        .get_or_fetch(&symbol, &query.interval, days_needed, false)
        .await?;

    let candles = series.candles();
    let tail = &candles[candles.len().saturating_sub(limit)..];
    let response = tail
        .iter()
        .map(|c| HistoricalCandle {
            timestamp: c.open_time.timestamp_millis(),
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        })
        .collect();

    Ok(Json(response))
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_depth_limit() -> u32 {
    20
}

fn default_history_limit() -> usize {
    100
}
