// Domain models for bar-series analysis
// These modules contain pure business logic independent of any host platform

pub mod timeseries;

// Re-export key types for convenience
pub use timeseries::{BarSeries, OhlcvTimeSeries, find_matching_ohlcv};
