use crate::cache::{CacheStats, SeriesCache, SeriesKey};
use crate::source::{interval_ms, MarketSource};
use crate::store::KlineStore;
use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use radar_core::config::HistoryConfig;
use radar_core::{RadarError, Result, TimeSeries};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Get-or-fetch layer in front of the market source.
///
/// Resolution order for a `(symbol, interval, days)` request:
/// 1. bounded in-memory cache (LRU + TTL),
/// 2. durable store, accepted only while its newest candle is younger than a
///    day, promoting the hit into memory,
/// 3. paginated collection from the source, persisted and cached on the way
///    out.
///
/// `force_refresh` skips levels 1 and 2 entirely.
pub struct HistoryService {
    source: Arc<MarketSource>,
    store: Arc<KlineStore>,
    cache: SeriesCache,
    request_delay: Duration,
    inflight: DashMap<SeriesKey, Arc<Mutex<()>>>,
}

impl HistoryService {
    pub fn new(source: Arc<MarketSource>, store: Arc<KlineStore>, config: &HistoryConfig) -> Self {
        Self {
            source,
            store,
            cache: SeriesCache::new(
                config.cache_size,
                Duration::from_secs(config.cache_ttl_secs),
            ),
            request_delay: Duration::from_millis(config.request_delay_ms),
            inflight: DashMap::new(),
        }
    }

    pub async fn get_or_fetch(
        &self,
        symbol: &str,
        interval: &str,
        days: u32,
        force_refresh: bool,
    ) -> Result<TimeSeries> {
        let key = SeriesKey {
            symbol: symbol.to_uppercase(),
            interval: interval.to_string(),
            days,
        };

        if !force_refresh {
            if let Some(series) = self.cache.get(&key) {
                return Ok(series);
            }
        }

        // Concurrent misses for the same key serialize here, so only the
        // first caller reaches upstream; the rest find the cache filled when
        // they re-check inside resolve().
        let gate = {
            let entry = self.inflight.entry(key.clone()).or_default();
            Arc::clone(entry.value())
        };
        let guard = gate.lock().await;

        let result = self.resolve(&key, force_refresh).await;

        drop(guard);
        self.inflight.remove(&key);
        result
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn resolve(&self, key: &SeriesKey, force_refresh: bool) -> Result<TimeSeries> {
        if !force_refresh {
            if let Some(series) = self.cache.get(key) {
                return Ok(series);
            }

            match self.store.load_series(&key.symbol, &key.interval).await {
                Ok(stored) => {
                    if let Some(latest) = stored.latest_open_time() {
                        if Utc::now().signed_duration_since(latest) < ChronoDuration::days(1) {
                            self.cache.insert(key.clone(), stored.clone());
                            return Ok(stored);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "could not read stored klines for {}/{}: {}",
                        key.symbol, key.interval, e
                    );
                }
            }
        }

        let series = self.collect(&key.symbol, &key.interval, key.days).await?;

        if let Err(e) = self
            .store
            .save_series(&key.symbol, &key.interval, &series)
            .await
        {
            warn!(
                "could not persist klines for {}/{}: {}",
                key.symbol, key.interval, e
            );
        }
        self.cache.insert(key.clone(), series.clone());

        Ok(series)
    }

    /// Sequential paginated collection, advancing past the last received
    /// candle each page. A page failure after at least one successful page
    /// degrades to the partial result instead of discarding collected data;
    /// a failure on the first page propagates.
    async fn collect(&self, symbol: &str, interval: &str, days: u32) -> Result<TimeSeries> {
        let step_ms = interval_ms(interval)
            .ok_or_else(|| RadarError::Parse(format!("unsupported interval: {}", interval)))?;

        let end_ms = Utc::now().timestamp_millis();
        let start_ms = end_ms - i64::from(days) * 24 * 60 * 60 * 1000;
        let total_candles = (end_ms - start_ms) / step_ms;
        let requests_needed = total_candles / 1000 + 1;

        info!(
            "collecting {} days of {} data for {} ({} candles, {} requests)",
            days, interval, symbol, total_candles, requests_needed
        );

        let mut collected = Vec::new();
        let mut current_start = start_ms;

        for page in 0..requests_needed {
            let batch = match self
                .source
                .fetch_klines(symbol, interval, 1000, Some(current_start), Some(end_ms))
                .await
            {
                Ok(batch) => batch,
                Err(e) if collected.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        "kline page {} failed for {}, keeping {} candles already collected: {}",
                        page + 1,
                        symbol,
                        collected.len(),
                        e
                    );
                    break;
                }
            };

            if batch.is_empty() {
                break;
            }

            if let Some(last) = batch.last() {
                current_start = last.open_time.timestamp_millis() + 1;
            }
            collected.extend(batch);

            if page + 1 < requests_needed {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        info!(
            "collected {} candles for {}/{}",
            collected.len(),
            symbol,
            interval
        );
        Ok(TimeSeries::new(collected))
    }
}
