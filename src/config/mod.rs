//! Configuration module for the td-sniper application.

pub mod persistence;
pub mod sequential;

// Re-export commonly used items
pub use persistence::{BAR_CACHE_PATH, CACHE_VERSION, bar_cache_filename};
pub use sequential::{AlertSettings, INTERVAL_WIDTH_TO_ANALYSE_MS, SEQUENTIAL, SequentialConfig};
