use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::domain::candle::Candle;
use crate::domain::pair_interval::PairInterval;

// ============================================================================
// BarSeries: what a counting engine needs from the host price series
// ============================================================================

/// Indexed access to the counting source and the OHLC extremes.
///
/// The engine does no bounds checking of its own. Callers guarantee that
/// every index they drive an engine over has sufficient history behind it;
/// an out-of-range access is a fatal index panic, not a recoverable error.
pub trait BarSeries {
    /// The value the directional comparisons run against (normally the close).
    fn value(&self, index: usize) -> f64;
    fn high(&self, index: usize) -> f64;
    fn low(&self, index: usize) -> f64;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// OhlcvTimeSeries: Raw time series data for a trading pair
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OhlcvTimeSeries {
    pub pair_interval: PairInterval,
    pub first_bar_timestamp_ms: i64,

    // Prices
    pub open_prices: Vec<f64>,
    pub high_prices: Vec<f64>,
    pub low_prices: Vec<f64>,
    pub close_prices: Vec<f64>,
}

impl OhlcvTimeSeries {
    pub fn new(pair_interval: PairInterval, first_bar_timestamp_ms: i64) -> Self {
        Self {
            pair_interval,
            first_bar_timestamp_ms,
            open_prices: Vec::new(),
            high_prices: Vec::new(),
            low_prices: Vec::new(),
            close_prices: Vec::new(),
        }
    }

    pub fn push_candle(&mut self, candle: Candle) {
        self.open_prices.push(candle.open_price);
        self.high_prices.push(candle.high_price);
        self.low_prices.push(candle.low_price);
        self.close_prices.push(candle.close_price);
    }

    pub fn get_candle(&self, idx: usize) -> Candle {
        Candle::new(
            self.open_prices[idx],
            self.high_prices[idx],
            self.low_prices[idx],
            self.close_prices[idx],
        )
    }

    pub fn bars(&self) -> usize {
        self.close_prices.len()
    }
}

impl BarSeries for OhlcvTimeSeries {
    fn value(&self, index: usize) -> f64 {
        self.close_prices[index]
    }

    fn high(&self, index: usize) -> f64 {
        self.high_prices[index]
    }

    fn low(&self, index: usize) -> f64 {
        self.low_prices[index]
    }

    fn len(&self) -> usize {
        self.close_prices.len()
    }
}

pub fn find_matching_ohlcv<'a>(
    timeseries_data: &'a [OhlcvTimeSeries],
    pair_name: &str,
    interval_ms: i64,
) -> Result<&'a OhlcvTimeSeries> {
    timeseries_data
        .iter()
        .find(|ohlcv| {
            ohlcv.pair_interval.name() == pair_name && ohlcv.pair_interval.interval_ms == interval_ms
        })
        .ok_or_else(|| {
            anyhow!(
                "No matching OHLCV data found for pair {} with interval {} ms",
                pair_name,
                interval_ms
            )
        })
}
