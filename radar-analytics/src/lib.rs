pub mod anomaly;
pub mod engine;
pub mod indicators;
pub mod snapshot;
mod stats;
pub mod tempo;
pub mod timeline;

pub use anomaly::{Alert, AlertSeverity};
pub use engine::RadarEngine;
pub use indicators::IndicatorSet;
pub use snapshot::{ChangeSnapshot, Momentum, RsiShift};
pub use tempo::{DirectionBias, TempoReport, VolatilityTrend};
pub use timeline::TimelineEvent;
