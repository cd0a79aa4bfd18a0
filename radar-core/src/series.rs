use crate::model::Candle;
use chrono::{DateTime, Utc};

/// Ordered candle series for one `(symbol, interval)` pair.
///
/// Construction normalizes the input: candles are sorted ascending by
/// `open_time` and duplicate open times are dropped, keeping the first
/// occurrence. Upstream pages can overlap or arrive out of order, so every
/// series entering the system goes through `TimeSeries::new`.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    candles: Vec<Candle>,
}

impl TimeSeries {
    pub fn new(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.open_time);
        candles.dedup_by_key(|c| c.open_time);
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn latest_open_time(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|c| c.open_time)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(minute: u32, close: f64) -> Candle {
        Candle {
            open_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn normalizes_out_of_order_input() {
        let series = TimeSeries::new(vec![candle(3, 30.0), candle(1, 10.0), candle(2, 20.0)]);
        assert_eq!(series.closes(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn duplicate_open_times_keep_first_occurrence() {
        let series = TimeSeries::new(vec![candle(1, 10.0), candle(2, 20.0), candle(2, 99.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.0, 20.0]);
    }

    #[test]
    fn open_times_strictly_increasing_after_normalization() {
        let series = TimeSeries::new(vec![
            candle(5, 1.0),
            candle(1, 2.0),
            candle(5, 3.0),
            candle(3, 4.0),
            candle(1, 5.0),
        ]);
        let times: Vec<_> = series.candles().iter().map(|c| c.open_time).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(series.len(), 3);
    }
}
