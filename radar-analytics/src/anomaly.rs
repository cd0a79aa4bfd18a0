use crate::indicators::IndicatorSet;
use crate::stats::{mean, sample_std};
use chrono::{DateTime, Utc};
use radar_core::config::ThresholdConfig;
use radar_core::{RadarError, Result, Ticker, TimeSeries};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Watch,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub context: String,
    #[serde(rename = "timestamp")]
    pub detected_at: DateTime<Utc>,
}

/// Run the four independent anomaly checks over one pass of inputs. Alerts
/// are recomputed fresh every pass; nothing is carried between calls.
///
/// The series is expected to be hourly candles spanning the configured
/// volume lookback window.
pub fn detect_anomalies(
    series: &TimeSeries,
    ticker: &Ticker,
    indicators: &IndicatorSet,
    thresholds: &ThresholdConfig,
) -> Result<Vec<Alert>> {
    let required = thresholds.volume.lookback_days as usize * 24;
    if series.len() < required {
        return Err(RadarError::InsufficientHistory {
            required,
            available: series.len(),
        });
    }

    let mut alerts = Vec::new();

    let volumes = series.volumes();
    if let Some(&current_volume) = volumes.last() {
        let volume_mean = mean(&volumes);
        let volume_std = sample_std(&volumes);
        if let Some(alert) =
            volume_spike_alert(current_volume, volume_mean, volume_std, thresholds)
        {
            alerts.push(alert);
        }
    }

    alerts.extend(rsi_alerts(indicators.rsi, thresholds));

    let week_high = series.highs().into_iter().fold(f64::MIN, f64::max);
    let week_low = series.lows().into_iter().fold(f64::MAX, f64::min);
    if let Some(alert) = breakout_alert(ticker.price, week_high, week_low, thresholds) {
        alerts.push(alert);
    }

    let candles = series.candles();
    let previous_close = candles[candles.len() - 2].close;
    if let Some(alert) = rapid_movement_alert(ticker.price, previous_close, thresholds) {
        alerts.push(alert);
    }

    for alert in &alerts {
        info!("{} for {}: {}", alert.title, ticker.symbol, alert.description);
    }

    Ok(alerts)
}

/// Volume z-score check. Fires only when the z-score exceeds the watch
/// threshold and the deviation from the mean is large enough to matter.
fn volume_spike_alert(
    current: f64,
    volume_mean: f64,
    volume_std: f64,
    thresholds: &ThresholdConfig,
) -> Option<Alert> {
    let z_score = if volume_std > 0.0 {
        (current - volume_mean) / volume_std
    } else {
        0.0
    };
    if z_score <= thresholds.volume.z_score_watch {
        return None;
    }

    let change_pct = if volume_mean > 0.0 {
        (current - volume_mean) / volume_mean * 100.0
    } else {
        0.0
    };
    if change_pct.abs() < thresholds.volume.min_change_pct {
        return None;
    }

    let severity = if z_score > thresholds.volume.z_score_high {
        AlertSeverity::High
    } else {
        AlertSeverity::Watch
    };

    Some(Alert {
        id: "volume_spike".to_string(),
        severity,
        icon: "📊".to_string(),
        title: "Volume Spike".to_string(),
        description: format!(
            "+{:.0}% vs {}-day average",
            change_pct, thresholds.volume.lookback_days
        ),
        context: format!("Z-score: {:.1} - Increased market activity", z_score),
        detected_at: Utc::now(),
    })
}

/// RSI extremes, strict comparisons. The extreme band takes precedence over
/// the standard band in the same direction; both directions are checked.
fn rsi_alerts(rsi: f64, thresholds: &ThresholdConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let bands = &thresholds.rsi;

    if rsi > bands.overbought_extreme {
        alerts.push(Alert {
            id: "rsi_overbought_extreme".to_string(),
            severity: AlertSeverity::High,
            icon: "🔴".to_string(),
            title: "RSI Extreme Overbought".to_string(),
            description: format!("{:.1} (>{:.0})", rsi, bands.overbought_extreme),
            context: "Strong pullback risk - Market may be overheated".to_string(),
            detected_at: Utc::now(),
        });
    } else if rsi > bands.overbought {
        alerts.push(Alert {
            id: "rsi_overbought".to_string(),
            severity: AlertSeverity::Watch,
            icon: "⚠️".to_string(),
            title: "RSI Overbought".to_string(),
            description: format!("{:.1} (>{:.0})", rsi, bands.overbought),
            context: "May indicate pullback risk".to_string(),
            detected_at: Utc::now(),
        });
    }

    if rsi < bands.oversold_extreme {
        alerts.push(Alert {
            id: "rsi_oversold_extreme".to_string(),
            severity: AlertSeverity::High,
            icon: "🟢".to_string(),
            title: "RSI Extreme Oversold".to_string(),
            description: format!("{:.1} (<{:.0})", rsi, bands.oversold_extreme),
            context: "Strong bounce opportunity - Market may be oversold".to_string(),
            detected_at: Utc::now(),
        });
    } else if rsi < bands.oversold {
        alerts.push(Alert {
            id: "rsi_oversold".to_string(),
            severity: AlertSeverity::Watch,
            icon: "⚠️".to_string(),
            title: "RSI Oversold".to_string(),
            description: format!("{:.1} (<{:.0})", rsi, bands.oversold),
            context: "May indicate bounce opportunity".to_string(),
            detected_at: Utc::now(),
        });
    }

    alerts
}

/// Price against the window's extremes, scaled by the tolerance bands.
fn breakout_alert(
    price: f64,
    week_high: f64,
    week_low: f64,
    thresholds: &ThresholdConfig,
) -> Option<Alert> {
    let lookback_days = thresholds.volume.lookback_days;

    if price >= week_high * (1.0 - thresholds.breakout.resistance_tolerance) {
        Some(Alert {
            id: "resistance_break".to_string(),
            severity: AlertSeverity::High,
            icon: "📈".to_string(),
            title: "Key Resistance Break".to_string(),
            description: format!(
                "Price at ${:.2} testing ${:.2} ({}-day high)",
                price, week_high, lookback_days
            ),
            context: "Potential continuation or rejection zone".to_string(),
            detected_at: Utc::now(),
        })
    } else if price <= week_low * (1.0 + thresholds.breakout.support_tolerance) {
        Some(Alert {
            id: "support_break".to_string(),
            severity: AlertSeverity::High,
            icon: "📉".to_string(),
            title: "Key Support Break".to_string(),
            description: format!("Price broke ${:.2} ({}-day low)", week_low, lookback_days),
            context: "Potential breakdown or bounce zone".to_string(),
            detected_at: Utc::now(),
        })
    } else {
        None
    }
}

/// Change over the last hourly candle, beyond the rapid-move bounds in
/// either direction.
fn rapid_movement_alert(
    price: f64,
    previous_close: f64,
    thresholds: &ThresholdConfig,
) -> Option<Alert> {
    if previous_close <= 0.0 {
        return None;
    }
    let change_pct = (price - previous_close) / previous_close * 100.0;

    let direction = if change_pct > thresholds.movement.rapid_rise_1h {
        "Surge"
    } else if change_pct < thresholds.movement.rapid_fall_1h {
        "Drop"
    } else {
        return None;
    };

    Some(Alert {
        id: "rapid_movement".to_string(),
        severity: AlertSeverity::High,
        icon: "💰".to_string(),
        title: format!("Rapid Price {}", direction),
        description: format!("{:+.1}% in 1 hour", change_pct),
        context: "Significant volatility detected".to_string(),
        detected_at: Utc::now(),
    })
}
