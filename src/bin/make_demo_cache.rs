use anyhow::Result;
use chrono::Utc;
use itertools::Itertools;

use td_sniper::config::{CACHE_VERSION, INTERVAL_WIDTH_TO_ANALYSE_MS};
use td_sniper::data::TimeSeriesCollection;
use td_sniper::data::cache_file::CacheFile;
use td_sniper::domain::{Candle, CandleType, PairInterval};
use td_sniper::models::OhlcvTimeSeries;

const DEMO_PAIRS: &[(&str, f64)] = &[
    ("BTCUSDT", 60_000.0),
    ("ETHUSDT", 3_000.0),
    ("SOLUSDT", 150.0),
];

/// Bars per pair. Long enough for several full counts and countdowns.
const DEMO_BARS: usize = 400;

fn main() -> Result<()> {
    build_demo_cache()
}

fn build_demo_cache() -> Result<()> {
    let mut collection = TimeSeriesCollection {
        name: "Demo TimeSeries Collection".to_string(),
        version: CACHE_VERSION,
        series_data: Vec::new(),
    };

    for (pair, start_price) in DEMO_PAIRS {
        let series = synth_series(pair, *start_price, DEMO_BARS);

        let candle_types = (0..series.bars())
            .map(|i| series.get_candle(i).get_type())
            .counts();
        let mean_body: f64 = (0..series.bars())
            .map(|i| {
                let (bottom, top) = series.get_candle(i).body_range();
                top - bottom
            })
            .sum::<f64>()
            / series.bars() as f64;
        println!(
            "{}: {} bars ({} bullish / {} bearish, mean body {:.2})",
            pair,
            series.bars(),
            candle_types.get(&CandleType::Bullish).copied().unwrap_or(0),
            candle_types.get(&CandleType::Bearish).copied().unwrap_or(0),
            mean_body,
        );

        collection.series_data.push(series);
    }

    let cache = CacheFile::new(INTERVAL_WIDTH_TO_ANALYSE_MS, collection, CACHE_VERSION);
    let output_path = CacheFile::default_cache_path(INTERVAL_WIDTH_TO_ANALYSE_MS);
    cache.save_to_path(&output_path)?;

    println!(
        "✅ Demo cache written to {:?} with {} pairs.",
        output_path,
        cache.data.series_data.len()
    );
    Ok(())
}

/// Deterministic synthetic tape: alternating trend legs with a small
/// two-bar zigzag, so flips, counts and countdowns all show up.
fn synth_series(pair: &str, start_price: f64, bars: usize) -> OhlcvTimeSeries {
    // Leg lengths chosen so moves regularly run past nine bars.
    const LEG_LENGTHS: [usize; 4] = [23, 11, 31, 17];

    let first_timestamp =
        Utc::now().timestamp_millis() - (bars as i64 * INTERVAL_WIDTH_TO_ANALYSE_MS);
    let mut series = OhlcvTimeSeries::new(
        PairInterval::new(pair, INTERVAL_WIDTH_TO_ANALYSE_MS),
        first_timestamp,
    );

    let step = start_price * 0.004;
    let mut close = start_price;
    let mut leg = 0usize;
    let mut remaining = LEG_LENGTHS[0];
    let mut downhill = true;

    for i in 0..bars {
        if remaining == 0 {
            leg = (leg + 1) % LEG_LENGTHS.len();
            remaining = LEG_LENGTHS[leg];
            downhill = !downhill;
        }
        remaining -= 1;

        let wiggle = (if i % 2 == 0 { 0.25 } else { -0.25 }) * step;
        let drift = if downhill { -step } else { step };
        let open = close;
        close += drift + wiggle;

        let high = open.max(close) + step * 0.3;
        let low = open.min(close) - step * 0.3;
        series.push_candle(Candle::new(open, high, low, close));
    }

    series
}
