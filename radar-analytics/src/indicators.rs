use crate::stats::round2;
use serde::{Deserialize, Serialize};
use ta::indicators::{
    BollingerBands, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex,
};
use ta::Next;

/// Standard indicator snapshot over a closing-price series: RSI(14),
/// MACD(12,26,9), Bollinger(20, 2σ), EMA(20), EMA(50). Values are the last
/// streamed output of each indicator, rounded to 2 decimals for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub ema_20: f64,
    pub ema_50: f64,
    #[serde(rename = "_demo", default)]
    pub demo: bool,
}

impl IndicatorSet {
    /// Fixed placeholder served when no usable series is available, so
    /// downstream consumers always get a well-formed shape.
    pub fn demo() -> Self {
        Self {
            rsi: 62.5,
            macd: 120.5,
            macd_signal: 115.2,
            macd_histogram: 5.3,
            bb_upper: 44500.0,
            bb_middle: 43250.0,
            bb_lower: 42000.0,
            ema_20: 43100.0,
            ema_50: 42800.0,
            demo: true,
        }
    }
}

/// Compute the indicator set from a closing-price series. A short series
/// degrades indicator validity but still computes; only an empty series
/// yields the demo placeholder.
pub fn compute(closes: &[f64]) -> IndicatorSet {
    if closes.is_empty() {
        return IndicatorSet::demo();
    }
    streamed(closes).unwrap_or_else(IndicatorSet::demo)
}

fn streamed(closes: &[f64]) -> Option<IndicatorSet> {
    let mut rsi = RelativeStrengthIndex::new(14).ok()?;
    let mut macd = MovingAverageConvergenceDivergence::new(12, 26, 9).ok()?;
    let mut bollinger = BollingerBands::new(20, 2.0).ok()?;
    let mut ema_20 = ExponentialMovingAverage::new(20).ok()?;
    let mut ema_50 = ExponentialMovingAverage::new(50).ok()?;

    let mut out = IndicatorSet {
        rsi: 50.0,
        macd: 0.0,
        macd_signal: 0.0,
        macd_histogram: 0.0,
        bb_upper: 0.0,
        bb_middle: 0.0,
        bb_lower: 0.0,
        ema_20: 0.0,
        ema_50: 0.0,
        demo: false,
    };

    for &close in closes {
        out.rsi = rsi.next(close);
        let m = macd.next(close);
        out.macd = m.macd;
        out.macd_signal = m.signal;
        out.macd_histogram = m.histogram;
        let b = bollinger.next(close);
        out.bb_upper = b.upper;
        out.bb_middle = b.average;
        out.bb_lower = b.lower;
        out.ema_20 = ema_20.next(close);
        out.ema_50 = ema_50.next(close);
    }

    // A perfectly flat series makes the RSI ratio 0/0.
    if !out.rsi.is_finite() {
        out.rsi = 50.0;
    }

    out.rsi = round2(out.rsi);
    out.macd = round2(out.macd);
    out.macd_signal = round2(out.macd_signal);
    out.macd_histogram = round2(out.macd_histogram);
    out.bb_upper = round2(out.bb_upper);
    out.bb_middle = round2(out.bb_middle);
    out.bb_lower = round2(out.bb_lower);
    out.ema_20 = round2(out.ema_20);
    out.ema_50 = round2(out.ema_50);

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_yields_flagged_demo_values() {
        let set = compute(&[]);
        assert!(set.demo);
        assert_eq!(set.rsi, 62.5);
    }

    #[test]
    fn rsi_stays_in_bounds_and_reads_overbought_on_a_rising_series() {
        let closes: Vec<f64> = (1..=60).map(|i| 100.0 + i as f64).collect();
        let set = compute(&closes);
        assert!(!set.demo);
        assert!(set.rsi > 70.0);
        assert!(set.rsi <= 100.0);
    }

    #[test]
    fn falling_series_reads_oversold() {
        let closes: Vec<f64> = (1..=60).map(|i| 500.0 - 2.0 * i as f64).collect();
        let set = compute(&closes);
        assert!(set.rsi < 30.0);
        assert!(set.rsi >= 0.0);
    }

    #[test]
    fn constant_series_collapses_bands_onto_the_price() {
        let closes = vec![250.0; 80];
        let set = compute(&closes);
        assert_eq!(set.bb_upper, 250.0);
        assert_eq!(set.bb_middle, 250.0);
        assert_eq!(set.bb_lower, 250.0);
        assert_eq!(set.ema_20, 250.0);
        assert_eq!(set.ema_50, 250.0);
        assert_eq!(set.macd, 0.0);
        assert_eq!(set.rsi, 50.0);
    }

    #[test]
    fn short_series_computes_without_error() {
        let set = compute(&[10.0, 11.0, 12.0]);
        assert!(!set.demo);
        assert!(set.rsi >= 0.0 && set.rsi <= 100.0);
    }
}
