use anyhow::{Context, Result};
use clap::Parser;
use strum::IntoEnumIterator;

use td_sniper::analysis::SignalKind;
use td_sniper::config::{INTERVAL_WIDTH_TO_ANALYSE_MS, SequentialConfig};
use td_sniper::data::cache_file::CacheFile;
use td_sniper::engine::{LogSink, TdEngine};
use td_sniper::{Cli, SequentialMonitor, find_matching_ohlcv};

fn main() -> Result<()> {
    // A. Init Logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // B. Parse Args
    let args = Cli::parse();
    let config = args.to_config();

    // C. Load Bars
    let cache_path = args
        .cache
        .clone()
        .unwrap_or_else(|| CacheFile::default_cache_path(INTERVAL_WIDTH_TO_ANALYSE_MS));
    let cache = CacheFile::load_from_path(&cache_path)
        .with_context(|| format!("No bar cache at {:?} (run make_demo_cache first)", cache_path))?;

    log::info!(
        "Loaded {:?} from {:?}",
        cache.data.unique_pair_names(),
        cache_path
    );

    // D. Count
    if let Some(pair) = &args.pair {
        // Single-pair mode logs every transition as it happens.
        run_single_pair(&cache, pair, config)
    } else {
        run_monitor(&cache, config)
    }
}

/// Drive one pair's engine directly with a logging sink.
fn run_single_pair(cache: &CacheFile, pair: &str, config: SequentialConfig) -> Result<()> {
    let series = find_matching_ohlcv(&cache.data.series_data, pair, cache.interval_ms)?;

    let mut engine = TdEngine::with_sink(config, LogSink::for_pair(pair));
    for index in engine.config.first_index()..series.bars() {
        engine.calculate(series, index);
    }

    log::info!(
        "[{}] {} setups still counting down",
        series.pair_interval,
        engine.open_setup_count()
    );
    Ok(())
}

/// Run every cached pair through the monitor and summarize.
fn run_monitor(cache: &CacheFile, config: SequentialConfig) -> Result<()> {
    let mut monitor = SequentialMonitor::new(config);
    for series in &cache.data.series_data {
        match monitor.process_series(series) {
            Ok(processed) => {
                log::info!("[{}] processed {} bars", series.pair_interval, processed)
            }
            Err(e) => log::warn!("[{}] skipped: {}", series.pair_interval, e),
        }
    }

    for context in monitor.pairs_with_signals() {
        log::info!(
            "[{}] {} setups still counting down",
            context.pair_name,
            context.open_setups()
        );
        for signal in &context.signals {
            log::info!("[{}] {}", context.pair_name, signal.description());
        }
    }

    let counts = monitor.signal_counts();
    for kind in SignalKind::iter() {
        log::info!("{}: {}", kind, counts.get(&kind).copied().unwrap_or(0));
    }

    Ok(())
}
