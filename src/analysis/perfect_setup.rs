//! Perfect-setup validation
//!
//! A completed sequential count is "perfect" when its final bars extend
//! beyond the extremes set in the middle of the count, a higher-confidence
//! exhaustion reading.

use crate::domain::SetupType;
use crate::engine::state::TdReversalSetup;
use crate::models::BarSeries;

/// Evaluate the extremum-ordering test for a freshly spawned setup.
///
/// Buy side: the last bar's low, or the second-to-last bar's low, must
/// undercut the lows five and six bars into the span. Sell side mirrors
/// with highs.
pub fn is_perfect_setup<B: BarSeries>(series: &B, setup: &TdReversalSetup) -> bool {
    let first = setup.first_sequential_bar_index;
    let last = setup.last_sequential_bar_index;

    match setup.setup_type {
        SetupType::Buy => {
            let ref_a = series.low(first + 5);
            let ref_b = series.low(first + 6);
            (series.low(last) <= ref_a && series.low(last) <= ref_b)
                || (series.low(last - 1) <= ref_a && series.low(last - 1) <= ref_b)
        }
        SetupType::Sell => {
            let ref_a = series.high(first + 5);
            let ref_b = series.high(first + 6);
            (series.high(last) >= ref_a && series.high(last) >= ref_b)
                || (series.high(last - 1) >= ref_a && series.high(last - 1) >= ref_b)
        }
    }
}
