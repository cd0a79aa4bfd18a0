use chrono::{TimeZone, Utc};
use radar_core::config::SourceConfig;
use radar_core::{BookLevel, Candle, OrderBookDepth, RadarError, Result, Ticker};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Gateway to the upstream market-data REST endpoints.
///
/// Every call walks the configured endpoint list in order and returns the
/// first successful response. A geo-restricted (451) or otherwise failing
/// endpoint is logged and skipped; only when the whole list is exhausted does
/// the call fail with `SourceUnavailable` carrying the last observed error.
pub struct MarketSource {
    client: Client,
    base_urls: Vec<String>,
}

impl MarketSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RadarError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_urls: config.base_urls.clone(),
        })
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut last_error = "no market data sources configured".to_string();

        for base_url in &self.base_urls {
            let url = format!("{}/{}", base_url, path);

            match self.client.get(&url).query(params).send().await {
                Ok(response) if response.status() == StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => {
                    warn!("{} geo-restricted (451), trying next source", url);
                    last_error = "geo-restricted (HTTP 451)".to_string();
                }
                Ok(response) if response.status().is_success() => match response.json().await {
                    Ok(value) => {
                        debug!("fetched {}", url);
                        return Ok(value);
                    }
                    Err(e) => {
                        warn!("{} returned an unreadable body, trying next source: {}", url, e);
                        last_error = e.to_string();
                    }
                },
                Ok(response) => {
                    warn!(
                        "{} responded with {}, trying next source",
                        url,
                        response.status()
                    );
                    last_error = format!("HTTP {}", response.status());
                }
                Err(e) => {
                    warn!("{} unreachable, trying next source: {}", url, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(RadarError::SourceUnavailable { last_error })
    }

    /// Fetch up to `limit` candles (capped at the upstream maximum of 1000).
    /// Rows with unparseable numeric fields are dropped rather than failing
    /// the whole batch.
    pub async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
    ) -> Result<Vec<Candle>> {
        let mut params = vec![
            ("symbol", symbol.to_uppercase()),
            ("interval", interval.to_string()),
            ("limit", limit.min(1000).to_string()),
        ];
        if let Some(start) = start_ms {
            params.push(("startTime", start.to_string()));
        }
        if let Some(end) = end_ms {
            params.push(("endTime", end.to_string()));
        }

        let payload = self.get_json("klines", &params).await?;
        let rows = payload
            .as_array()
            .ok_or_else(|| RadarError::Parse("kline payload is not an array".to_string()))?;

        let candles: Vec<Candle> = rows.iter().filter_map(parse_kline_row).collect();
        if candles.len() < rows.len() {
            warn!(
                "dropped {} malformed kline rows for {}",
                rows.len() - candles.len(),
                symbol
            );
        }

        Ok(candles)
    }

    /// 24h ticker statistics for a symbol.
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let symbol = symbol.to_uppercase();
        let payload = self
            .get_json("ticker/24hr", &[("symbol", symbol.clone())])
            .await?;
        let raw: RawTicker = serde_json::from_value(payload)?;

        Ok(Ticker {
            symbol,
            price: parse_price(&raw.last_price, "lastPrice")?,
            change_24h: parse_price(&raw.price_change_percent, "priceChangePercent")?,
            volume_24h: parse_price(&raw.volume, "volume")?,
            high_24h: parse_price(&raw.high_price, "highPrice")?,
            low_24h: parse_price(&raw.low_price, "lowPrice")?,
            timestamp: Utc::now(),
            demo: false,
        })
    }

    /// Ticker that never fails: when every source is down the fixed demo
    /// payload is served instead, flagged via `_demo`, so read-only surfaces
    /// stay available without network access.
    pub async fn ticker_or_demo(&self, symbol: &str) -> Ticker {
        match self.fetch_ticker(symbol).await {
            Ok(ticker) => ticker,
            Err(e) => {
                warn!("ticker unavailable for {}, serving demo data: {}", symbol, e);
                Ticker::demo(&symbol.to_uppercase())
            }
        }
    }

    /// Order book depth, normalized to numeric levels. Unparseable levels are
    /// dropped.
    pub async fn fetch_depth(&self, symbol: &str, limit: u32) -> Result<OrderBookDepth> {
        let symbol = symbol.to_uppercase();
        let payload = self
            .get_json(
                "depth",
                &[("symbol", symbol.clone()), ("limit", limit.to_string())],
            )
            .await?;
        let raw: RawDepth = serde_json::from_value(payload)?;

        Ok(OrderBookDepth {
            symbol,
            bids: parse_levels(&raw.bids),
            asks: parse_levels(&raw.asks),
            timestamp: Utc::now(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicker {
    last_price: String,
    price_change_percent: String,
    volume: String,
    high_price: String,
    low_price: String,
}

#[derive(Debug, Deserialize)]
struct RawDepth {
    bids: Vec<(String, String)>,
    asks: Vec<(String, String)>,
}

fn parse_price(value: &str, field: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| RadarError::Parse(format!("{} is not a number: {:?}", field, value)))
}

fn parse_levels(raw: &[(String, String)]) -> Vec<BookLevel> {
    raw.iter()
        .filter_map(|(price, quantity)| {
            Some(BookLevel {
                price: price.parse().ok()?,
                quantity: quantity.parse().ok()?,
            })
        })
        .collect()
}

/// One kline row is `[open_time_ms, open, high, low, close, volume, ...]`
/// with the numeric fields encoded as strings. Returns `None` when any field
/// fails to parse so callers can exclude the record.
fn parse_kline_row(row: &Value) -> Option<Candle> {
    let fields = row.as_array()?;
    let open_time = Utc.timestamp_millis_opt(fields.first()?.as_i64()?).single()?;

    let number = |index: usize| -> Option<f64> {
        let field = fields.get(index)?;
        field
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| field.as_f64())
    };

    Some(Candle {
        open_time,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
    })
}

/// Convert an interval token like `1m`, `1h`, `4h`, `1d`, `1w` to
/// milliseconds.
pub fn interval_ms(interval: &str) -> Option<i64> {
    let (number, unit) = interval.split_at(interval.len().checked_sub(1)?);
    let number: i64 = number.parse().ok()?;
    let unit_ms = match unit {
        "m" => 60 * 1000,
        "h" => 60 * 60 * 1000,
        "d" => 24 * 60 * 60 * 1000,
        "w" => 7 * 24 * 60 * 60 * 1000,
        _ => return None,
    };
    Some(number * unit_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_standard_kline_row() {
        let row = json!([1735689600000_i64, "100.0", "110.0", "95.0", "105.0", "1234.5", 0, "x", 1, "y", "z", "0"]);
        let candle = parse_kline_row(&row).unwrap();
        assert_eq!(candle.open, 100.0);
        assert_eq!(candle.high, 110.0);
        assert_eq!(candle.low, 95.0);
        assert_eq!(candle.close, 105.0);
        assert_eq!(candle.volume, 1234.5);
    }

    #[test]
    fn malformed_rows_are_excluded_not_fatal() {
        assert!(parse_kline_row(&json!([1735689600000_i64, "oops", "1", "1", "1", "1"])).is_none());
        assert!(parse_kline_row(&json!(["not-a-timestamp", "1", "1", "1", "1", "1"])).is_none());
        assert!(parse_kline_row(&json!([1735689600000_i64, "1", "2"])).is_none());
    }

    #[test]
    fn numeric_kline_fields_are_accepted() {
        let row = json!([1735689600000_i64, 100.0, 110.0, 95.0, 105.0, 1234.5]);
        assert!(parse_kline_row(&row).is_some());
    }

    #[test]
    fn interval_tokens_convert_to_milliseconds() {
        assert_eq!(interval_ms("1m"), Some(60_000));
        assert_eq!(interval_ms("1h"), Some(3_600_000));
        assert_eq!(interval_ms("4h"), Some(14_400_000));
        assert_eq!(interval_ms("1d"), Some(86_400_000));
        assert_eq!(interval_ms("2x"), None);
        assert_eq!(interval_ms(""), None);
    }

    #[tokio::test]
    async fn exhausted_sources_report_the_last_error() {
        let source = MarketSource::new(&SourceConfig {
            base_urls: vec!["http://127.0.0.1:9".to_string()],
            timeout_secs: 1,
        })
        .unwrap();

        let result = source.fetch_klines("BTCUSDT", "1h", 10, None, None).await;
        match result {
            Err(RadarError::SourceUnavailable { last_error }) => {
                assert!(!last_error.is_empty());
            }
            other => panic!("expected SourceUnavailable, got {:?}", other.map(|c| c.len())),
        }
    }
}
