//! Counting engine configuration

use crate::utils::TimeUtils;

/// The candle interval all caches and analysis runs are built at.
pub const INTERVAL_WIDTH_TO_ANALYSE_MS: i64 = TimeUtils::MS_IN_30_MIN;

/// Alert thresholds. -1 disables an alert.
#[derive(Debug, Clone)]
pub struct AlertSettings {
    // Fire when a sequential count reaches this bar number
    pub on_sequential_bar: i32,
    // Fire when a countdown reaches this bar number
    pub on_countdown_bar: i32,
}

/// The Master Counting Configuration
///
/// Fixed at engine construction; the engine never mutates it.
#[derive(Debug, Clone)]
pub struct SequentialConfig {
    // A sequential count completes at this bar number
    pub max_sequential_bars: u32,
    // A countdown completes (and retires its setup) at this bar number
    pub max_countdown_bars: u32,
    // Comparison lag: every count bar is compared against the value this many bars back
    pub period: usize,
    // When true, a count may only start on a qualifying price-flip bar
    pub price_flip: bool,

    // Sub-groups
    pub alerts: AlertSettings,
}

pub const SEQUENTIAL: SequentialConfig = SequentialConfig {
    max_sequential_bars: 9,
    max_countdown_bars: 13,
    period: 4,
    price_flip: false,

    alerts: AlertSettings {
        on_sequential_bar: -1,
        on_countdown_bar: -1,
    },
};

impl Default for SequentialConfig {
    fn default() -> Self {
        SEQUENTIAL.clone()
    }
}

impl SequentialConfig {
    /// Smallest series length the engine can be driven over.
    pub fn min_bars(&self) -> usize {
        self.period + 1
    }

    /// First index with enough lookback for the directional comparison.
    pub fn first_index(&self) -> usize {
        self.period
    }
}
