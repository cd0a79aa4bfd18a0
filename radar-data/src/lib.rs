pub mod cache;
pub mod history;
pub mod source;
pub mod store;

pub use cache::{CacheStats, SeriesCache, SeriesKey};
pub use history::HistoryService;
pub use source::MarketSource;
pub use store::KlineStore;
