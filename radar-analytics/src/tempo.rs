use crate::stats::{mean, sample_std};
use chrono::{DateTime, Utc};
use radar_core::config::ThresholdConfig;
use radar_core::{RadarError, Result, TimeSeries};
use serde::{Deserialize, Serialize};

const REQUIRED_CANDLES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityTrend {
    Accelerating,
    Decelerating,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionBias {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityReading {
    pub level: f64,
    pub trend: VolatilityTrend,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReading {
    pub level: f64,
    #[serde(rename = "vsAverage")]
    pub vs_average: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionReading {
    pub level: f64,
    pub bias: DirectionBias,
    pub label: String,
}

/// Composite market-rhythm snapshot: volatility trend, trading activity and
/// directional bias, plus a rule-selected summary sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoReport {
    pub volatility: VolatilityReading,
    pub activity: ActivityReading,
    pub direction: DirectionReading,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

/// Derive the tempo report from an hourly series. Requires at least 24
/// candles; expects the series to span a few days so the rolling windows
/// have context.
pub fn measure_tempo(series: &TimeSeries, thresholds: &ThresholdConfig) -> Result<TempoReport> {
    if series.len() < REQUIRED_CANDLES {
        return Err(RadarError::InsufficientHistory {
            required: REQUIRED_CANDLES,
            available: series.len(),
        });
    }

    let closes = series.closes();
    let volumes = series.volumes();
    let n = closes.len();
    let bands = &thresholds.tempo;

    // Volatility rhythm: last 6 hours against the 6 hours before.
    let recent_std = sample_std(&closes[n - 6..]);
    let previous_std = sample_std(&closes[n - 12..n - 6]);
    let volatility_change = if previous_std > 0.0 {
        (recent_std - previous_std) / previous_std * 100.0
    } else {
        0.0
    };

    let (trend, volatility_label) = if volatility_change > bands.accelerating_pct {
        (VolatilityTrend::Accelerating, "High Volatility")
    } else if volatility_change < -bands.accelerating_pct {
        (VolatilityTrend::Decelerating, "Low")
    } else {
        (VolatilityTrend::Stable, "Moderate")
    };

    let window_std = sample_std(&closes);
    let volatility_level = if window_std > 0.0 {
        (recent_std / window_std * 100.0).min(100.0)
    } else {
        50.0
    };

    // Trading activity: recent volume against the 24h average.
    let recent_volume = mean(&volumes[n - 6..]);
    let avg_volume_24h = mean(&volumes[n - 24..]);
    let activity_vs_average = if avg_volume_24h > 0.0 {
        (recent_volume - avg_volume_24h) / avg_volume_24h * 100.0
    } else {
        0.0
    };
    let activity_level = (50.0 + activity_vs_average / 2.0).clamp(0.0, 100.0);

    let activity_label = if activity_level > bands.very_active_level {
        "Very Active"
    } else if activity_level > bands.active_level {
        "Active"
    } else {
        "Quiet"
    };

    // Directional bias: short-term momentum blended with the SMA-20 slope.
    let current_price = closes[n - 1];
    let price_6h_ago = closes[n - 7];
    let price_momentum = if price_6h_ago > 0.0 {
        (current_price - price_6h_ago) / price_6h_ago * 100.0
    } else {
        0.0
    };

    let sma_20 = mean(&closes[n - 20..]);
    let sma_20_prev = if n > 21 {
        mean(&closes[n - 21..n - 1])
    } else {
        sma_20
    };
    let sma_slope = if sma_20_prev > 0.0 {
        (sma_20 - sma_20_prev) / sma_20_prev * 100.0
    } else {
        0.0
    };

    let direction_score = (price_momentum + sma_slope) / 2.0;
    let (bias, direction_label, direction_level) = if direction_score > bands.bullish_score {
        (
            DirectionBias::Bullish,
            "Uptrend",
            (50.0 + direction_score * 10.0).min(100.0),
        )
    } else if direction_score < bands.bearish_score {
        (
            DirectionBias::Bearish,
            "Downtrend",
            (50.0 + direction_score * 10.0).max(0.0),
        )
    } else {
        (DirectionBias::Neutral, "Sideways", 50.0)
    };

    let summary = summarize(volatility_level, direction_level, bias, activity_level);

    Ok(TempoReport {
        volatility: VolatilityReading {
            level: volatility_level.round(),
            trend,
            label: volatility_label.to_string(),
        },
        activity: ActivityReading {
            level: activity_level.round(),
            vs_average: activity_vs_average.round(),
            label: activity_label.to_string(),
        },
        direction: DirectionReading {
            level: direction_level.round(),
            bias,
            label: direction_label.to_string(),
        },
        summary,
        timestamp: Utc::now(),
    })
}

/// Fixed decision table over the three readings; no free-text generation.
fn summarize(
    volatility_level: f64,
    direction_level: f64,
    bias: DirectionBias,
    activity_level: f64,
) -> String {
    if volatility_level > 70.0 && direction_level > 40.0 && direction_level < 60.0 {
        "Active trading with increased volatility but no clear directional trend. Consider waiting for confirmation signals before taking positions."
    } else if volatility_level > 70.0 && bias == DirectionBias::Bullish {
        "Strong upward momentum with high volatility. Potential for continuation but watch for exhaustion signals."
    } else if volatility_level > 70.0 && bias == DirectionBias::Bearish {
        "Downward pressure with elevated volatility. Support levels may be tested."
    } else if activity_level < 40.0 {
        "Low trading activity and reduced volatility. Market in consolidation phase."
    } else {
        "Normal market conditions with balanced activity levels."
    }
    .to_string()
}
