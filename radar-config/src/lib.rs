use config::{Config, Environment, File};
use radar_core::{RadarConfig, RadarError, Result};
use std::path::Path;
use tracing::info;

/// Load configuration from an optional YAML file plus `MARKET_RADAR`-prefixed
/// environment overrides (`MARKET_RADAR__SERVER__PORT=9000` style). Every
/// field has a default, so a missing file still yields a runnable config.
pub fn load<P: AsRef<Path>>(path: P) -> Result<RadarConfig> {
    let settings = Config::builder()
        .add_source(File::from(path.as_ref()).required(false))
        .add_source(Environment::with_prefix("MARKET_RADAR").separator("__"))
        .build()
        .map_err(|e| RadarError::Configuration(e.to_string()))?;

    let config: RadarConfig = settings
        .try_deserialize()
        .map_err(|e| RadarError::Configuration(e.to_string()))?;

    validate(&config)?;
    info!("configuration loaded");
    Ok(config)
}

pub fn validate(config: &RadarConfig) -> Result<()> {
    if config.source.base_urls.is_empty() {
        return Err(RadarError::Configuration(
            "no market data sources configured".to_string(),
        ));
    }
    if config.source.timeout_secs == 0 {
        return Err(RadarError::Configuration(
            "source timeout must be positive".to_string(),
        ));
    }
    if config.history.cache_size == 0 {
        return Err(RadarError::Configuration(
            "cache size must be positive".to_string(),
        ));
    }
    if config.broadcast.interval_secs == 0 {
        return Err(RadarError::Configuration(
            "broadcast interval must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Write the effective configuration back out as YAML, handy for
/// bootstrapping a config file to edit.
pub fn save<P: AsRef<Path>>(config: &RadarConfig, path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(config)
        .map_err(|e| RadarError::Configuration(e.to_string()))?;
    std::fs::write(&path, yaml)
        .map_err(|e| RadarError::Configuration(e.to_string()))?;
    info!("configuration saved to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load("does-not-exist.yaml").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.history.cache_size, 20);
        assert_eq!(config.source.base_urls.len(), 2);
        assert_eq!(config.thresholds.volume.z_score_watch, 2.0);
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "server:\n  port: 9100\nthresholds:\n  rsi:\n    overbought: 75\n",
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.thresholds.rsi.overbought, 75.0);
        // Untouched sections keep their defaults.
        assert_eq!(config.thresholds.rsi.oversold, 30.0);
        assert_eq!(config.broadcast.interval_secs, 30);
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yaml");

        let mut config = RadarConfig::default();
        config.server.port = 9999;
        config.thresholds.volume.min_change_pct = 75.0;
        save(&config, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.server.port, 9999);
        assert_eq!(loaded.thresholds.volume.min_change_pct, 75.0);
    }

    #[test]
    fn empty_source_list_is_rejected() {
        let mut config = RadarConfig::default();
        config.source.base_urls.clear();
        assert!(validate(&config).is_err());
    }
}
