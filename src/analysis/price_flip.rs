//! Price-flip detection
//!
//! A flip is a two-bar pattern marking the potential start of a new
//! directional count: the previous bar closes one side of its lagged
//! reference while the current bar closes the other side of its own.

use crate::domain::FlipType;
use crate::models::BarSeries;

/// Classify the bar at `index` as a bullish flip, a bearish flip, or neither.
///
/// Pure function of the series. The earliest bars, without `period + 1`
/// bars of history, can never flip.
pub fn detect_flip<B: BarSeries>(series: &B, index: usize, period: usize) -> FlipType {
    if index < period + 1 {
        return FlipType::None;
    }

    let prev = series.value(index - 1);
    let prev_lagged = series.value(index - (period + 1));
    let current = series.value(index);
    let current_lagged = series.value(index - period);

    if prev < prev_lagged && current > current_lagged {
        FlipType::Bullish
    } else if prev > prev_lagged && current < current_lagged {
        FlipType::Bearish
    } else {
        FlipType::None
    }
}
