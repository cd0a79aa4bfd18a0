use crate::stats::mean;
use chrono::{Duration, Utc};
use radar_core::{RadarError, Result, TimeSeries};
use serde::{Deserialize, Serialize};

const REQUIRED_CANDLES: usize = 6;
const SCAN_LIMIT: usize = 24;
const MAX_EVENTS: usize = 6;
const MIN_EVENTS: usize = 3;
const VOLUME_SURGE_FACTOR: f64 = 2.0;
const BREAKOUT_FACTOR: f64 = 1.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Price,
    Volume,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    /// Wall-clock `HH:MM` of the candle the event was found in.
    pub time: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub icon: String,
    pub title: String,
    pub description: String,
}

/// Scan the most recent candles (newest first, capped at 24) for volume
/// surges and price breakouts. At most 6 events come back; when fewer than 3
/// genuine events exist, synthetic session markers pad the list so the
/// timeline is never empty-looking.
pub fn build_timeline(series: &TimeSeries) -> Result<Vec<TimelineEvent>> {
    if series.len() < REQUIRED_CANDLES {
        return Err(RadarError::InsufficientHistory {
            required: REQUIRED_CANDLES,
            available: series.len(),
        });
    }

    let candles = series.candles();
    let n = candles.len();
    let scan_floor = n.saturating_sub(SCAN_LIMIT + 1);
    let mut events = Vec::new();

    for i in ((scan_floor + 1)..n).rev() {
        let candle = &candles[i];
        let time = candle.open_time.format("%H:%M").to_string();

        if i < n - 1 {
            let window: Vec<f64> = candles[i.saturating_sub(6)..i]
                .iter()
                .map(|c| c.volume)
                .collect();
            let avg_volume = mean(&window);
            if avg_volume > 0.0
                && candle.volume > avg_volume * VOLUME_SURGE_FACTOR
                && events.len() < MAX_EVENTS
            {
                let volume_change = (candle.volume - avg_volume) / avg_volume * 100.0;
                events.push(TimelineEvent {
                    id: format!("volume_{}", i),
                    time: time.clone(),
                    kind: EventKind::Volume,
                    icon: "📊".to_string(),
                    title: "Volume Surge".to_string(),
                    description: format!("Volume spike detected (+{:.0}%)", volume_change),
                });
            }
        }

        if i >= 6 {
            let recent_high = candles[i - 6..i]
                .iter()
                .map(|c| c.high)
                .fold(f64::MIN, f64::max);
            if candle.high > recent_high * BREAKOUT_FACTOR && events.len() < MAX_EVENTS {
                let price_change = if candle.open > 0.0 {
                    (candle.close - candle.open) / candle.open * 100.0
                } else {
                    0.0
                };
                events.push(TimelineEvent {
                    id: format!("price_{}", i),
                    time,
                    kind: EventKind::Price,
                    icon: "💰".to_string(),
                    title: "Price Breakout".to_string(),
                    description: format!(
                        "Broke ${:.2} resistance ({:+.1}%)",
                        candle.high, price_change
                    ),
                });
            }
        }
    }

    pad_with_session_markers(&mut events);

    events.sort_by(|a, b| b.time.cmp(&a.time));
    events.truncate(MAX_EVENTS);
    Ok(events)
}

/// Synthetic placeholders for quiet days.
fn pad_with_session_markers(events: &mut Vec<TimelineEvent>) {
    let markers = [
        (
            "session_asia",
            18,
            "Asia Session Open",
            "Asian session opened with moderate activity",
        ),
        (
            "session_europe",
            10,
            "Europe Session Open",
            "European session brought steady flows",
        ),
        (
            "session_us",
            2,
            "US Session Open",
            "US session activity within normal range",
        ),
    ];

    let mut markers = markers.iter();
    while events.len() < MIN_EVENTS {
        match markers.next() {
            Some((id, hours_ago, title, description)) => events.push(TimelineEvent {
                id: (*id).to_string(),
                time: (Utc::now() - Duration::hours(*hours_ago))
                    .format("%H:%M")
                    .to_string(),
                kind: EventKind::Price,
                icon: "🌏".to_string(),
                title: (*title).to_string(),
                description: (*description).to_string(),
            }),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use radar_core::Candle;

    fn candle(hour_index: usize, high: f64, volume: f64) -> Candle {
        Candle {
            open_time: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
                + Duration::hours(hour_index as i64),
            open: 100.0,
            high,
            low: 99.0,
            close: 100.0,
            volume,
        }
    }

    fn flat_series(len: usize) -> TimeSeries {
        TimeSeries::new((0..len).map(|i| candle(i, 100.5, 100.0)).collect())
    }

    #[test]
    fn five_candles_are_not_enough() {
        let result = build_timeline(&flat_series(5));
        assert!(matches!(
            result,
            Err(RadarError::InsufficientHistory { required: 6, .. })
        ));
    }

    #[test]
    fn quiet_data_is_padded_to_three_synthetic_events() {
        let events = build_timeline(&flat_series(24)).unwrap();
        assert_eq!(events.len(), MIN_EVENTS);
        assert!(events.iter().all(|e| e.id.starts_with("session_")));
    }

    #[test]
    fn a_volume_surge_is_reported_once() {
        let mut candles: Vec<Candle> = (0..24).map(|i| candle(i, 100.5, 100.0)).collect();
        candles[20].volume = 500.0;
        let events = build_timeline(&TimeSeries::new(candles)).unwrap();

        let surges: Vec<_> = events.iter().filter(|e| e.id == "volume_20").collect();
        assert_eq!(surges.len(), 1);
        assert_eq!(surges[0].kind, EventKind::Volume);
    }

    #[test]
    fn a_breakout_candle_is_reported_with_its_level() {
        let mut candles: Vec<Candle> = (0..24).map(|i| candle(i, 100.5, 100.0)).collect();
        candles[15].high = 120.0;
        let events = build_timeline(&TimeSeries::new(candles)).unwrap();

        let breakout = events.iter().find(|e| e.id == "price_15").unwrap();
        assert_eq!(breakout.kind, EventKind::Price);
        assert!(breakout.description.contains("$120.00"));
    }

    #[test]
    fn busy_data_never_exceeds_six_events() {
        // A spike every fourth hour trips the surge check repeatedly.
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let volume = if i % 4 == 3 { 1000.0 } else { 50.0 };
                candle(i, 100.5, volume)
            })
            .collect();
        let events = build_timeline(&TimeSeries::new(candles)).unwrap();
        assert_eq!(events.len(), MAX_EVENTS);
    }

    #[test]
    fn events_come_back_most_recent_first() {
        let mut candles: Vec<Candle> = (0..24).map(|i| candle(i, 100.5, 100.0)).collect();
        candles[10].volume = 500.0;
        candles[20].volume = 500.0;
        let events = build_timeline(&TimeSeries::new(candles)).unwrap();

        let times: Vec<&String> = events.iter().map(|e| &e.time).collect();
        let mut sorted = times.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(times, sorted);
    }
}
