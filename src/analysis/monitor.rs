use std::collections::HashMap;
use std::fmt;

use anyhow::{Result, bail};
use itertools::Itertools;

use crate::config::SequentialConfig;
use crate::domain::{CountType, SetupType, TradeDirection};
use crate::engine::events::{RecordingSink, TdEvent};
use crate::engine::TdEngine;
use crate::models::OhlcvTimeSeries;

/// Multi-pair monitoring system for exhaustion signals.
/// Owns one counting engine per tracked pair and folds engine events into a
/// per-pair signal list.
pub struct SequentialMonitor {
    config: SequentialConfig,
    contexts: HashMap<String, PairSequentialContext>,
}

/// Context and state for a single tracked pair.
pub struct PairSequentialContext {
    pub pair_name: String,
    pub engine: TdEngine<RecordingSink>,
    /// Next series index to feed the engine
    pub next_index: usize,
    pub signals: Vec<TdSignal>,
}

impl PairSequentialContext {
    fn new(pair_name: String, config: SequentialConfig) -> Self {
        Self {
            pair_name,
            engine: TdEngine::with_sink(config, RecordingSink::default()),
            next_index: 0,
            signals: Vec::new(),
        }
    }

    /// Check if this pair has produced anything of interest
    pub fn has_signals(&self) -> bool {
        !self.signals.is_empty()
    }

    /// Setups still waiting on their countdown
    pub fn open_setups(&self) -> usize {
        self.engine.open_setup_count()
    }
}

impl SequentialMonitor {
    /// Create a new empty monitor
    pub fn new(config: SequentialConfig) -> Self {
        Self {
            config,
            contexts: HashMap::new(),
        }
    }

    /// Feed any unprocessed bars of `series` through the pair's engine.
    /// Returns the number of bars processed this call.
    pub fn process_series(&mut self, series: &OhlcvTimeSeries) -> Result<usize> {
        if series.bars() < self.config.min_bars() {
            bail!(
                "Insufficient data: {} has only {} bars (minimum: {}). \
                 This pair is not currently analyzable.",
                series.pair_interval.name(),
                series.bars(),
                self.config.min_bars()
            );
        }

        let pair_name = series.pair_interval.name().to_string();
        let config = self.config.clone();
        let context = self
            .contexts
            .entry(pair_name.clone())
            .or_insert_with(|| PairSequentialContext::new(pair_name, config));

        let start = context.next_index.max(self.config.first_index());
        let mut processed = 0;
        for index in start..series.bars() {
            context.engine.calculate(series, index);
            processed += 1;
        }
        context.next_index = series.bars();

        let max_sequential = self.config.max_sequential_bars;
        let max_countdown = self.config.max_countdown_bars;
        for event in context.engine.sink.drain() {
            if let Some(signal) = TdSignal::from_event(&event, max_sequential, max_countdown) {
                context.signals.push(signal);
            }
        }

        Ok(processed)
    }

    /// Get all pairs with signals
    pub fn pairs_with_signals(&self) -> Vec<&PairSequentialContext> {
        self.contexts
            .values()
            .filter(|ctx| ctx.has_signals())
            .collect()
    }

    /// Get context for a specific pair
    pub fn get_context(&self, pair: &str) -> Option<&PairSequentialContext> {
        self.contexts.get(pair)
    }

    /// Get count of monitored pairs
    pub fn pair_count(&self) -> usize {
        self.contexts.len()
    }

    /// Signal totals by kind across every tracked pair
    pub fn signal_counts(&self) -> HashMap<SignalKind, usize> {
        self.contexts
            .values()
            .flat_map(|ctx| ctx.signals.iter().map(|s| s.kind()))
            .counts()
    }
}

/// A noteworthy transition surfaced by the counting engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TdSignal {
    /// A sequential count ran its full length
    SequentialComplete { index: usize, count_type: CountType },
    /// A completed count also passed the extremum-ordering test
    PerfectSetup { index: usize, setup_type: SetupType },
    /// An open setup's countdown reached its final bar
    CountdownComplete { index: usize, setup_type: SetupType },
    /// A configured progress threshold was hit
    Alert {
        index: usize,
        direction: TradeDirection,
        countdown: bool,
    },
}

impl TdSignal {
    fn from_event(event: &TdEvent, max_sequential: u32, max_countdown: u32) -> Option<Self> {
        match event {
            TdEvent::SequentialBar { bar } if bar.number == max_sequential => {
                Some(TdSignal::SequentialComplete {
                    index: bar.index,
                    count_type: bar.count_type,
                })
            }
            TdEvent::PerfectSetup { setup } => Some(TdSignal::PerfectSetup {
                index: setup.last_sequential_bar_index,
                setup_type: setup.setup_type,
            }),
            TdEvent::CountdownBar { bar } if bar.number == max_countdown => {
                // Countdown bars carry the opposite polarity of their setup.
                let setup_type = match bar.count_type {
                    CountType::Bullish => SetupType::Sell,
                    CountType::Bearish => SetupType::Buy,
                    CountType::Neutral => return None,
                };
                Some(TdSignal::CountdownComplete {
                    index: bar.index,
                    setup_type,
                })
            }
            TdEvent::Alert {
                index,
                direction,
                countdown,
            } => Some(TdSignal::Alert {
                index: *index,
                direction: *direction,
                countdown: *countdown,
            }),
            _ => None,
        }
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            TdSignal::SequentialComplete { .. } => SignalKind::SequentialComplete,
            TdSignal::PerfectSetup { .. } => SignalKind::PerfectSetup,
            TdSignal::CountdownComplete { .. } => SignalKind::CountdownComplete,
            TdSignal::Alert { .. } => SignalKind::Alert,
        }
    }

    /// Get a human-readable description of this signal
    pub fn description(&self) -> String {
        match self {
            TdSignal::SequentialComplete { index, count_type } => {
                format!("9️⃣ {:?} sequential completed at bar {}", count_type, index)
            }
            TdSignal::PerfectSetup { index, setup_type } => {
                format!("🎯 Perfect {} setup at bar {}", setup_type, index)
            }
            TdSignal::CountdownComplete { index, setup_type } => {
                format!("🔔 {} countdown completed at bar {}", setup_type, index)
            }
            TdSignal::Alert {
                index,
                direction,
                countdown,
            } => {
                let phase = if *countdown { "countdown" } else { "sequential" };
                format!("⏰ {} alert ({}) at bar {}", phase, direction, index)
            }
        }
    }
}

/// Signal categories for summary reporting
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, strum_macros::EnumIter)]
pub enum SignalKind {
    SequentialComplete,
    PerfectSetup,
    CountdownComplete,
    Alert,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SignalKind::SequentialComplete => write!(f, "Completed sequentials"),
            SignalKind::PerfectSetup => write!(f, "Perfect setups"),
            SignalKind::CountdownComplete => write!(f, "Completed countdowns"),
            SignalKind::Alert => write!(f, "Alerts"),
        }
    }
}
