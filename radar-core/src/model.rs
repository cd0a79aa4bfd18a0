use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One interval's open/high/low/close/volume aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub price: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "_demo", default)]
    pub demo: bool,
}

impl Ticker {
    /// Placeholder returned when every upstream source is unreachable, so
    /// consumers keep a well-formed shape to work with.
    pub fn demo(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: 43250.50,
            change_24h: 2.35,
            volume_24h: 28_500_000_000.0,
            high_24h: 44100.00,
            low_24h: 42800.00,
            timestamp: Utc::now(),
            demo: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookDepth {
    pub symbol: String,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub timestamp: DateTime<Utc>,
}
