pub mod config;
pub mod model;
pub mod series;

use thiserror::Error;

pub use config::{RadarConfig, ThresholdConfig};
pub use model::{BookLevel, Candle, OrderBookDepth, Ticker};
pub use series::TimeSeries;

#[derive(Debug, Error)]
pub enum RadarError {
    #[error("all market data sources failed: {last_error}")]
    SourceUnavailable { last_error: String },

    #[error("insufficient history: {required} candles required, {available} available")]
    InsufficientHistory { required: usize, available: usize },

    #[error("malformed upstream payload: {0}")]
    Parse(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RadarError>;
