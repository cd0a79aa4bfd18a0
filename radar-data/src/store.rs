use chrono::{TimeZone, Utc};
use dashmap::DashMap;
use radar_core::{Candle, RadarError, Result, TimeSeries};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use tracing::{debug, info};

/// Durable kline store: one SQLite file per `(symbol, interval)` pair under
/// the configured data directory. Pools are created lazily on first access
/// and cached for the process lifetime.
pub struct KlineStore {
    base_dir: PathBuf,
    pools: DashMap<String, SqlitePool>,
}

impl KlineStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir).map_err(|e| {
            RadarError::Configuration(format!("data dir {}: {}", base_dir.display(), e))
        })?;

        Ok(Self {
            base_dir,
            pools: DashMap::new(),
        })
    }

    async fn pool(&self, symbol: &str, interval: &str) -> Result<SqlitePool> {
        let key = format!("{}_{}", symbol, interval);
        if let Some(pool) = self.pools.get(&key) {
            return Ok(pool.clone());
        }

        let options = SqliteConnectOptions::new()
            .filename(self.base_dir.join(format!("{}.db", key)))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS candles (
                time INTEGER PRIMARY KEY,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await?;

        self.pools.insert(key, pool.clone());
        Ok(pool)
    }

    pub async fn save_series(
        &self,
        symbol: &str,
        interval: &str,
        series: &TimeSeries,
    ) -> Result<()> {
        let pool = self.pool(symbol, interval).await?;

        for candle in series.candles() {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO candles (time, open, high, low, close, volume)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(candle.open_time.timestamp_millis())
            .bind(candle.open)
            .bind(candle.high)
            .bind(candle.low)
            .bind(candle.close)
            .bind(candle.volume)
            .execute(&pool)
            .await?;
        }

        debug!(
            "persisted {} candles for {}/{}",
            series.len(),
            symbol,
            interval
        );
        Ok(())
    }

    /// Load the stored series in ascending time order. Rows that fail to
    /// decode are skipped.
    pub async fn load_series(&self, symbol: &str, interval: &str) -> Result<TimeSeries> {
        let pool = self.pool(symbol, interval).await?;

        let rows = sqlx::query("SELECT time, open, high, low, close, volume FROM candles ORDER BY time ASC")
            .fetch_all(&pool)
            .await?;

        let candles: Vec<Candle> = rows
            .into_iter()
            .filter_map(|row| {
                let ms: i64 = row.try_get(0).ok()?;
                Some(Candle {
                    open_time: Utc.timestamp_millis_opt(ms).single()?,
                    open: row.try_get(1).ok()?,
                    high: row.try_get(2).ok()?,
                    low: row.try_get(3).ok()?,
                    close: row.try_get(4).ok()?,
                    volume: row.try_get(5).ok()?,
                })
            })
            .collect();

        Ok(TimeSeries::new(candles))
    }

    /// Close every open pool. Called once on shutdown.
    pub async fn close(&self) {
        let pools: Vec<SqlitePool> = self.pools.iter().map(|entry| entry.value().clone()).collect();
        self.pools.clear();
        for pool in pools {
            pool.close().await;
        }
        info!("kline store closed");
    }
}
