#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod models;
pub mod utils;

// The counting engine
pub mod engine;

// Re-export commonly used types
pub use analysis::{SequentialMonitor, SignalKind, TdSignal};
pub use config::{SEQUENTIAL, SequentialConfig};
pub use data::TimeSeriesCollection;
pub use domain::{Candle, CountType, FlipType, PairInterval, SetupType, TradeDirection};
pub use engine::{TdBar, TdEngine, TdEventSink, TdReversalSetup};
pub use models::{BarSeries, OhlcvTimeSeries, find_matching_ohlcv};

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Bar cache to analyse (defaults to the demo cache path)
    #[arg(long)]
    pub cache: Option<std::path::PathBuf>,

    /// Restrict analysis to a single pair
    #[arg(long)]
    pub pair: Option<String>,

    /// Only allow a count to start on a qualifying price-flip bar
    #[arg(long, default_value_t = false)]
    pub price_flip: bool,

    /// Fire an alert when a sequential count reaches this bar number (-1 = off)
    #[arg(long, default_value_t = -1)]
    pub alert_sequential: i32,

    /// Fire an alert when a countdown reaches this bar number (-1 = off)
    #[arg(long, default_value_t = -1)]
    pub alert_countdown: i32,
}

impl Cli {
    /// Merge CLI overrides onto the compiled-in defaults.
    pub fn to_config(&self) -> SequentialConfig {
        SequentialConfig {
            price_flip: self.price_flip,
            alerts: config::AlertSettings {
                on_sequential_bar: self.alert_sequential,
                on_countdown_bar: self.alert_countdown,
            },
            ..SequentialConfig::default()
        }
    }
}
