//! File persistence and serialization configuration

/// Directory path for storing bar data caches
pub const BAR_CACHE_PATH: &str = "bar_data";

/// Base filename for bar cache files (without extension)
pub const BAR_CACHE_FILENAME_WITHOUT_EXT: &str = "bars";

/// Current version of the bar cache serialization format
pub const CACHE_VERSION: f64 = 1.0;

use crate::utils::TimeUtils;

/// Generate interval-specific cache filename
/// Example: "bars_30m_v1.bin"
pub fn bar_cache_filename(interval_ms: i64) -> String {
    let interval_str = TimeUtils::interval_to_string(interval_ms);
    format!(
        "{}_{}_v{}.bin",
        BAR_CACHE_FILENAME_WITHOUT_EXT, interval_str, CACHE_VERSION
    )
}
