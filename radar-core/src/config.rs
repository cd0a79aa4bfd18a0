use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub history: HistoryConfig,
    pub broadcast: BroadcastConfig,
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Upstream REST endpoints, tried in order. The US host goes first to
    /// avoid geo-restriction responses on US-based deployments.
    pub base_urls: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_urls: vec![
                "https://api.binance.us/api/v3".to_string(),
                "https://api.binance.com/api/v3".to_string(),
            ],
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub data_dir: String,
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
    /// Pause between paginated kline requests, upstream rate-limit etiquette.
    pub request_delay_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/klines".to_string(),
            cache_size: 20,
            cache_ttl_secs: 300,
            request_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub interval_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

/// Detection sensitivity table. Loaded once at startup and never mutated, so
/// operators retune alerting through configuration instead of code changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub volume: VolumeThresholds,
    pub rsi: RsiThresholds,
    pub breakout: BreakoutThresholds,
    pub movement: MovementThresholds,
    pub tempo: TempoThresholds,
    pub dedup: DedupThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeThresholds {
    pub z_score_watch: f64,
    pub z_score_high: f64,
    /// Minimum percent deviation from the mean before a spike is reported.
    pub min_change_pct: f64,
    pub lookback_days: u32,
}

impl Default for VolumeThresholds {
    fn default() -> Self {
        Self {
            z_score_watch: 2.0,
            z_score_high: 3.0,
            min_change_pct: 50.0,
            lookback_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiThresholds {
    pub overbought: f64,
    pub overbought_extreme: f64,
    pub oversold: f64,
    pub oversold_extreme: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            overbought_extreme: 80.0,
            oversold: 30.0,
            oversold_extreme: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutThresholds {
    pub resistance_tolerance: f64,
    pub support_tolerance: f64,
}

impl Default for BreakoutThresholds {
    fn default() -> Self {
        Self {
            resistance_tolerance: 0.002,
            support_tolerance: 0.002,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementThresholds {
    pub rapid_rise_1h: f64,
    pub rapid_fall_1h: f64,
}

impl Default for MovementThresholds {
    fn default() -> Self {
        Self {
            rapid_rise_1h: 3.0,
            rapid_fall_1h: -3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoThresholds {
    /// Percent change in rolling std-dev that flips the volatility trend.
    pub accelerating_pct: f64,
    pub very_active_level: f64,
    pub active_level: f64,
    pub bullish_score: f64,
    pub bearish_score: f64,
}

impl Default for TempoThresholds {
    fn default() -> Self {
        Self {
            accelerating_pct: 20.0,
            very_active_level: 70.0,
            active_level: 40.0,
            bullish_score: 1.0,
            bearish_score: -1.0,
        }
    }
}

/// Alert spacing knobs. Parsed for operator compatibility but not enforced;
/// alerts are recomputed fresh on every pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupThresholds {
    pub min_secs_between_alerts: u64,
    pub max_concurrent_alerts: usize,
}

impl Default for DedupThresholds {
    fn default() -> Self {
        Self {
            min_secs_between_alerts: 300,
            max_concurrent_alerts: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_match_documented_values() {
        let t = ThresholdConfig::default();
        assert_eq!(t.volume.z_score_watch, 2.0);
        assert_eq!(t.volume.z_score_high, 3.0);
        assert_eq!(t.volume.min_change_pct, 50.0);
        assert_eq!(t.volume.lookback_days, 7);
        assert_eq!(t.rsi.overbought, 70.0);
        assert_eq!(t.rsi.oversold_extreme, 20.0);
        assert_eq!(t.breakout.resistance_tolerance, 0.002);
        assert_eq!(t.movement.rapid_rise_1h, 3.0);
        assert_eq!(t.tempo.accelerating_pct, 20.0);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: RadarConfig = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.history.cache_size, 20);
        assert_eq!(cfg.broadcast.interval_secs, 30);
    }
}
