use crate::indicators::IndicatorSet;
use crate::stats::{mean, round1, round2};
use chrono::{DateTime, Utc};
use radar_core::{RadarError, Result, Ticker, TimeSeries};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Rising,
    Falling,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RsiShift {
    pub from: f64,
    pub to: f64,
}

/// One-hour change snapshot: how the market moved since the previous hourly
/// candle, with the RSI shift and a coarse momentum call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSnapshot {
    pub price_change: f64,
    pub volume_change: f64,
    pub rsi_shift: RsiShift,
    pub momentum: Momentum,
    pub news_count: u32,
    pub news_topic: String,
    pub timestamp: DateTime<Utc>,
}

/// Compare the live price against the close one hour back and the latest
/// candle's volume against the trailing 24h average.
///
/// The previous RSI is estimated from the current reading and the price
/// change rather than recomputed from the earlier window; the estimate is
/// cheap and good enough for a shift indicator.
pub fn change_snapshot(
    series: &TimeSeries,
    ticker: &Ticker,
    indicators: &IndicatorSet,
) -> Result<ChangeSnapshot> {
    if series.len() < 2 {
        return Err(RadarError::InsufficientHistory {
            required: 2,
            available: series.len(),
        });
    }

    let candles = series.candles();
    let n = candles.len();

    let previous_close = candles[n - 2].close;
    let price_change = if previous_close > 0.0 {
        (ticker.price - previous_close) / previous_close * 100.0
    } else {
        0.0
    };

    let volumes = series.volumes();
    let avg_volume = mean(&volumes[n.saturating_sub(24)..]);
    let current_volume = volumes[n - 1];
    let volume_change = if avg_volume > 0.0 {
        (current_volume - avg_volume) / avg_volume * 100.0
    } else {
        0.0
    };

    let rsi_current = indicators.rsi;
    let rsi_previous = (rsi_current - price_change * 0.5).clamp(0.0, 100.0);

    let momentum = if price_change > 1.0 && volume_change > 20.0 {
        Momentum::Rising
    } else if price_change < -1.0 && volume_change > 20.0 {
        Momentum::Falling
    } else {
        Momentum::Neutral
    };

    Ok(ChangeSnapshot {
        price_change: round2(price_change),
        volume_change: round2(volume_change),
        rsi_shift: RsiShift {
            from: round1(rsi_previous),
            to: round1(rsi_current),
        },
        momentum,
        // News flow comes from an external collector; the snapshot itself
        // carries placeholders.
        news_count: 0,
        news_topic: "Market".to_string(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use radar_core::Candle;

    fn series(closes_volumes: &[(f64, f64)]) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let candles = closes_volumes
            .iter()
            .enumerate()
            .map(|(i, (close, volume))| Candle {
                open_time: base + Duration::hours(i as i64),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: *volume,
            })
            .collect();
        TimeSeries::new(candles)
    }

    fn ticker(price: f64) -> Ticker {
        Ticker {
            symbol: "BTCUSDT".to_string(),
            price,
            change_24h: 0.0,
            volume_24h: 0.0,
            high_24h: 0.0,
            low_24h: 0.0,
            timestamp: Utc::now(),
            demo: false,
        }
    }

    fn indicators(rsi: f64) -> IndicatorSet {
        IndicatorSet {
            rsi,
            demo: false,
            ..IndicatorSet::demo()
        }
    }

    #[test]
    fn one_candle_is_insufficient() {
        let result = change_snapshot(&series(&[(100.0, 10.0)]), &ticker(100.0), &indicators(50.0));
        assert!(matches!(
            result,
            Err(RadarError::InsufficientHistory { required: 2, .. })
        ));
    }

    #[test]
    fn rising_momentum_needs_price_and_volume_together() {
        // Previous close 100, live price 102 (+2%), last volume well above
        // the 24h average.
        let snapshot = change_snapshot(
            &series(&[(100.0, 100.0), (100.0, 100.0), (102.0, 200.0)]),
            &ticker(102.0),
            &indicators(55.0),
        )
        .unwrap();
        assert_eq!(snapshot.price_change, 2.0);
        assert!(snapshot.volume_change > 20.0);
        assert_eq!(snapshot.momentum, Momentum::Rising);
    }

    #[test]
    fn price_move_without_volume_stays_neutral() {
        let snapshot = change_snapshot(
            &series(&[(100.0, 100.0), (100.0, 100.0), (102.0, 100.0)]),
            &ticker(102.0),
            &indicators(55.0),
        )
        .unwrap();
        assert_eq!(snapshot.momentum, Momentum::Neutral);
    }

    #[test]
    fn falling_momentum_mirrors_rising() {
        let snapshot = change_snapshot(
            &series(&[(100.0, 100.0), (100.0, 100.0), (97.0, 200.0)]),
            &ticker(97.0),
            &indicators(45.0),
        )
        .unwrap();
        assert_eq!(snapshot.momentum, Momentum::Falling);
    }

    #[test]
    fn rsi_shift_estimate_is_clamped_to_bounds() {
        let snapshot = change_snapshot(
            &series(&[(100.0, 100.0), (100.0, 100.0), (90.0, 100.0)]),
            &ticker(90.0),
            &indicators(99.0),
        )
        .unwrap();
        // 99 - (-10 * 0.5) = 104, clamped.
        assert_eq!(snapshot.rsi_shift.from, 100.0);
        assert_eq!(snapshot.rsi_shift.to, 99.0);
    }

    #[test]
    fn snapshot_serializes_with_camel_case_fields() {
        let snapshot = change_snapshot(
            &series(&[(100.0, 100.0), (100.0, 100.0), (100.0, 100.0)]),
            &ticker(100.0),
            &indicators(50.0),
        )
        .unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("priceChange").is_some());
        assert!(json.get("volumeChange").is_some());
        assert!(json.get("rsiShift").is_some());
        assert_eq!(json["momentum"], "neutral");
        assert_eq!(json["newsTopic"], "Market");
    }
}
