use chrono::{Duration, Utc};
use radar_core::config::{HistoryConfig, SourceConfig};
use radar_core::{Candle, RadarError, TimeSeries};
use radar_data::{HistoryService, KlineStore, MarketSource};
use std::sync::Arc;

/// A source whose endpoint list points at nothing, so any level-3 collection
/// attempt fails fast with `SourceUnavailable`.
fn dead_source() -> Arc<MarketSource> {
    Arc::new(
        MarketSource::new(&SourceConfig {
            base_urls: vec!["http://127.0.0.1:9".to_string()],
            timeout_secs: 1,
        })
        .unwrap(),
    )
}

fn hourly_series(count: usize, newest: chrono::DateTime<Utc>) -> TimeSeries {
    let candles = (0..count)
        .map(|i| Candle {
            open_time: newest - Duration::hours((count - 1 - i) as i64),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 500.0,
        })
        .collect();
    TimeSeries::new(candles)
}

fn service(store: Arc<KlineStore>) -> HistoryService {
    HistoryService::new(
        dead_source(),
        store,
        &HistoryConfig {
            data_dir: String::new(),
            cache_size: 20,
            cache_ttl_secs: 300,
            request_delay_ms: 1,
        },
    )
}

#[tokio::test]
async fn fresh_store_data_is_served_without_touching_the_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(KlineStore::new(dir.path()).unwrap());
    store
        .save_series("BTCUSDT", "1h", &hourly_series(48, Utc::now()))
        .await
        .unwrap();

    let history = service(store.clone());
    let series = history
        .get_or_fetch("BTCUSDT", "1h", 1, false)
        .await
        .unwrap();
    assert_eq!(series.len(), 48);

    // Second call is answered from the promoted in-memory entry.
    let again = history
        .get_or_fetch("BTCUSDT", "1h", 1, false)
        .await
        .unwrap();
    assert_eq!(again.len(), 48);
    assert_eq!(history.cache_stats().size, 1);

    store.close().await;
}

#[tokio::test]
async fn force_refresh_bypasses_both_cache_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(KlineStore::new(dir.path()).unwrap());
    store
        .save_series("BTCUSDT", "1h", &hourly_series(48, Utc::now()))
        .await
        .unwrap();

    let history = service(store.clone());
    // Warm both tiers.
    history
        .get_or_fetch("BTCUSDT", "1h", 1, false)
        .await
        .unwrap();

    // With a dead source the only way this can fail is by actually going to
    // level 3, which is exactly what force_refresh requires.
    let refreshed = history.get_or_fetch("BTCUSDT", "1h", 1, true).await;
    assert!(matches!(
        refreshed,
        Err(RadarError::SourceUnavailable { .. })
    ));

    store.close().await;
}

#[tokio::test]
async fn stale_store_data_falls_through_to_collection() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(KlineStore::new(dir.path()).unwrap());
    store
        .save_series(
            "ETHUSDT",
            "1h",
            &hourly_series(48, Utc::now() - Duration::days(3)),
        )
        .await
        .unwrap();

    let history = service(store.clone());
    let result = history.get_or_fetch("ETHUSDT", "1h", 1, false).await;
    assert!(matches!(result, Err(RadarError::SourceUnavailable { .. })));

    store.close().await;
}
