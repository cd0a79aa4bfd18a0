use chrono::{TimeZone, Utc};
use radar_core::{Candle, TimeSeries};
use radar_data::KlineStore;

fn series(base_ms: i64, closes: &[f64]) -> TimeSeries {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, close)| Candle {
            open_time: Utc
                .timestamp_millis_opt(base_ms + i as i64 * 3_600_000)
                .single()
                .unwrap(),
            open: *close,
            high: close + 1.0,
            low: close - 1.0,
            close: *close,
            volume: 100.0,
        })
        .collect();
    TimeSeries::new(candles)
}

#[tokio::test]
async fn save_and_load_preserves_order_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let store = KlineStore::new(dir.path()).unwrap();

    let original = series(1_735_689_600_000, &[100.0, 101.0, 102.0]);
    store.save_series("BTCUSDT", "1h", &original).await.unwrap();

    let loaded = store.load_series("BTCUSDT", "1h").await.unwrap();
    assert_eq!(loaded.closes(), original.closes());
    assert_eq!(loaded.latest_open_time(), original.latest_open_time());

    store.close().await;
}

#[tokio::test]
async fn overlapping_saves_upsert_instead_of_duplicating() {
    let dir = tempfile::tempdir().unwrap();
    let store = KlineStore::new(dir.path()).unwrap();

    store
        .save_series("ETHUSDT", "1h", &series(1_735_689_600_000, &[10.0, 11.0]))
        .await
        .unwrap();
    store
        .save_series("ETHUSDT", "1h", &series(1_735_689_600_000, &[20.0, 21.0, 22.0]))
        .await
        .unwrap();

    let loaded = store.load_series("ETHUSDT", "1h").await.unwrap();
    assert_eq!(loaded.closes(), vec![20.0, 21.0, 22.0]);

    store.close().await;
}

#[tokio::test]
async fn keys_are_isolated_per_symbol_and_interval() {
    let dir = tempfile::tempdir().unwrap();
    let store = KlineStore::new(dir.path()).unwrap();

    store
        .save_series("BTCUSDT", "1h", &series(1_735_689_600_000, &[1.0]))
        .await
        .unwrap();

    let other = store.load_series("BTCUSDT", "4h").await.unwrap();
    assert!(other.is_empty());

    store.close().await;
}
