use std::collections::BTreeMap;

use crate::analysis::perfect_setup::is_perfect_setup;
use crate::analysis::price_flip::detect_flip;
use crate::config::SequentialConfig;
use crate::domain::{CountType, FlipType, SetupType};
use crate::engine::events::{NullSink, TdEventSink};
use crate::engine::state::{SetupKey, TdBar, TdReversalSetup};
use crate::models::BarSeries;

/// The TD counting engine.
///
/// Owns at most one in-progress sequential count plus the registry of open
/// reversal setups, and advances all of them one bar at a time. Drive it
/// with `calculate` once per bar, in increasing index order. The caller
/// guarantees every processed index has enough history behind it; the
/// first safe index is `SequentialConfig::first_index`.
pub struct TdEngine<S: TdEventSink = NullSink> {
    pub config: SequentialConfig,
    pub sink: S,

    /// The one in-progress sequential bar, if a count is running
    pub active: Option<TdBar>,

    /// Superseded sequential bars, keyed by bar index
    pub sequential_history: BTreeMap<usize, TdBar>,
    /// Recorded countdown bars, keyed by bar index
    pub countdown_history: BTreeMap<usize, TdBar>,
    /// Open setups, keyed by their sequential span
    pub open_setups: BTreeMap<SetupKey, TdReversalSetup>,
}

impl TdEngine<NullSink> {
    pub fn new(config: SequentialConfig) -> Self {
        Self::with_sink(config, NullSink)
    }
}

impl<S: TdEventSink> TdEngine<S> {
    pub fn with_sink(config: SequentialConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            active: None,
            sequential_history: BTreeMap::new(),
            countdown_history: BTreeMap::new(),
            open_setups: BTreeMap::new(),
        }
    }

    pub fn open_setup_count(&self) -> usize {
        self.open_setups.len()
    }

    /// Advance every live count by one bar.
    pub fn calculate<B: BarSeries>(&mut self, series: &B, index: usize) {
        debug_assert!(
            index >= self.config.first_index(),
            "bar {index} lacks lookback history"
        );

        // Archive the previous sequential bar once the series moves past it.
        if let Some(active) = &self.active {
            if index > active.index {
                self.sequential_history.insert(active.index, active.clone());
            }
        }

        // A close back through the lagged reference breaks the count.
        // No setup is ever spawned from an invalidation.
        if let Some(active) = &self.active {
            let lagged = series.value(index - self.config.period);
            let broken = match active.count_type {
                CountType::Bullish => series.value(index) <= lagged,
                CountType::Bearish => series.value(index) >= lagged,
                CountType::Neutral => false,
            };
            if broken {
                self.active = None;
            }
        }

        let flip = detect_flip(series, index, self.config.period);
        self.sink.on_price_flip(index, flip);

        match self.active.take() {
            None => {
                self.active = self.start_count(series, index, flip);
            }
            // Duplicate call for the same bar: leave the count untouched.
            Some(active) if active.index == index => {
                self.active = Some(active);
            }
            Some(mut active) if active.number < self.config.max_sequential_bars => {
                active.index = index;
                active.number += 1;
                if self.config.alerts.on_sequential_bar == active.number as i32 {
                    if let Some(direction) = active.count_type.reversal_direction() {
                        self.sink.on_alert(index, direction, false);
                    }
                }
                self.active = Some(active);
            }
            Some(completed) => {
                // The count is full. The bar that ends it also begins the
                // next count, then the completed span spawns a setup.
                self.active = self.start_count(series, index, flip);
                self.spawn_reversal_setup(series, &completed);
            }
        }

        if let Some(active) = &self.active {
            self.sink.on_sequential_bar(active);
        }

        // Countdowns lag the sequential side by one bar.
        self.advance_countdowns(series, index - 1);
    }

    fn start_count<B: BarSeries>(
        &self,
        series: &B,
        index: usize,
        flip: FlipType,
    ) -> Option<TdBar> {
        let count_type = if self.config.price_flip {
            flip.count_type()?
        } else {
            let value = series.value(index);
            let lagged = series.value(index - self.config.period);
            if value > lagged {
                CountType::Bullish
            } else if value < lagged {
                CountType::Bearish
            } else {
                return None;
            }
        };

        Some(TdBar {
            index,
            number: 1,
            count_type,
        })
    }

    fn spawn_reversal_setup<B: BarSeries>(&mut self, series: &B, completed: &TdBar) {
        let setup_type = match completed.count_type {
            CountType::Bullish => SetupType::Sell,
            CountType::Bearish => SetupType::Buy,
            CountType::Neutral => return,
        };

        let first = completed.index - self.config.max_sequential_bars as usize;
        let setup = TdReversalSetup::new(setup_type, first, completed.index);

        if is_perfect_setup(series, &setup) {
            self.sink.on_perfect_setup(&setup);
        }

        // Perfect or not, the setup joins the open registry.
        self.open_setups.insert(setup.key(), setup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candle, PairInterval, TradeDirection};
    use crate::engine::events::{RecordingSink, TdEvent};
    use crate::models::OhlcvTimeSeries;

    fn series_from_closes(closes: &[f64]) -> OhlcvTimeSeries {
        let mut series = OhlcvTimeSeries::new(PairInterval::new("TESTUSDT", 60_000), 0);
        for &close in closes {
            series.push_candle(Candle::new(close, close + 0.5, close - 0.5, close));
        }
        series
    }

    fn falling_closes(bars: usize) -> Vec<f64> {
        (0..bars).map(|i| 100.0 - i as f64).collect()
    }

    fn run<S: TdEventSink>(engine: &mut TdEngine<S>, series: &OhlcvTimeSeries) {
        for index in engine.config.first_index()..series.bars() {
            engine.calculate(series, index);
        }
    }

    #[test]
    fn bearish_sequential_completes_and_spawns_buy_setup() {
        // 14 strictly falling closes: count runs 1..9 over bars 4..12 and
        // the call at bar 13 detects the completion.
        let series = series_from_closes(&falling_closes(14));
        let mut engine = TdEngine::with_sink(SequentialConfig::default(), RecordingSink::default());
        run(&mut engine, &series);

        assert_eq!(engine.open_setups.len(), 1, "one setup per completion");
        let setup = engine
            .open_setups
            .get(&(3, 12))
            .expect("setup keyed by its sequential span");
        assert_eq!(setup.setup_type, SetupType::Buy);
        assert_eq!(setup.first_sequential_bar_index, 3);
        assert_eq!(setup.last_sequential_bar_index, 12);

        // Countdown bar 1 may land on the final sequential bar.
        assert_eq!(setup.countdown_bar_number, 1);
        assert_eq!(setup.first_countdown_bar_index, Some(12));

        // The completing bar immediately begins the next count.
        let active = engine.active.as_ref().expect("new count started");
        assert_eq!((active.index, active.number), (13, 1));
        assert_eq!(active.count_type, CountType::Bearish);

        // A falling run undercuts its own mid-count lows, so this one is perfect.
        let perfect = engine
            .sink
            .events
            .iter()
            .any(|e| matches!(e, TdEvent::PerfectSetup { .. }));
        assert!(perfect, "perfect-setup callback fired");
    }

    #[test]
    fn sequential_numbers_increase_by_one_per_bar() {
        let series = series_from_closes(&falling_closes(14));
        let mut engine = TdEngine::with_sink(SequentialConfig::default(), RecordingSink::default());
        run(&mut engine, &series);

        let numbered: Vec<(usize, u32)> = engine
            .sink
            .events
            .iter()
            .filter_map(|e| match e {
                TdEvent::SequentialBar { bar } => Some((bar.index, bar.number)),
                _ => None,
            })
            .collect();

        let expected: Vec<(usize, u32)> = (4..=12)
            .zip(1..=9)
            .chain(std::iter::once((13, 1)))
            .collect();
        assert_eq!(numbered, expected, "one increment per distinct bar");

        let max_number = numbered.iter().map(|(_, n)| *n).max().unwrap();
        assert_eq!(max_number, 9, "a count never exceeds its maximum");
    }

    #[test]
    fn broken_count_resets_without_spawning_a_setup() {
        // Falls for six count bars, then closes back above the lagged reference.
        let mut closes = falling_closes(10);
        closes.push(98.0); // bar 10: 98 >= close[6] = 94 breaks the bearish count
        let series = series_from_closes(&closes);
        let mut engine = TdEngine::new(SequentialConfig::default());
        run(&mut engine, &series);

        assert!(
            engine.open_setups.is_empty(),
            "invalidation never spawns a setup"
        );

        // The breaking bar starts a fresh bullish count instead.
        let active = engine.active.as_ref().expect("new count after the break");
        assert_eq!((active.index, active.number), (10, 1));
        assert_eq!(active.count_type, CountType::Bullish);
    }

    #[test]
    fn flat_series_never_starts_a_count() {
        let series = series_from_closes(&[10.0; 8]);
        let mut engine = TdEngine::new(SequentialConfig::default());
        run(&mut engine, &series);

        assert!(engine.active.is_none());
        assert!(engine.sequential_history.is_empty());
        assert!(engine.open_setups.is_empty());
    }

    #[test]
    fn price_flip_mode_only_starts_on_a_flip() {
        // Rising closes with a sharp dip at bar 5 and a recovery at bar 6.
        let series = series_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 9.0, 15.0, 16.0]);
        let config = SequentialConfig {
            price_flip: true,
            ..SequentialConfig::default()
        };
        let mut engine = TdEngine::new(config);

        // Without flip gating, bar 4 (14 > close[0] = 10) would start a count.
        engine.calculate(&series, 4);
        assert!(engine.active.is_none(), "no flip possible this early");

        // The dip closes below its lagged reference while bar 4 closed above
        // its own: a bearish flip, and the count starts here.
        engine.calculate(&series, 5);
        let active = engine.active.as_ref().expect("dip bar is a bearish flip");
        assert_eq!((active.index, active.number), (5, 1));
        assert_eq!(active.count_type, CountType::Bearish);

        // The recovery breaks the bearish count and flips bullish in one bar.
        engine.calculate(&series, 6);
        let active = engine.active.as_ref().expect("recovery flips bullish");
        assert_eq!((active.index, active.number), (6, 1));
        assert_eq!(active.count_type, CountType::Bullish);

        engine.calculate(&series, 7);
        let active = engine.active.as_ref().unwrap();
        assert_eq!((active.index, active.number), (7, 2));
    }

    #[test]
    fn duplicate_calculate_call_is_a_no_op() {
        let series = series_from_closes(&falling_closes(20));
        let mut engine = TdEngine::new(SequentialConfig::default());
        run(&mut engine, &series);

        let active = engine.active.clone();
        let sequential = engine.sequential_history.clone();
        let countdown = engine.countdown_history.clone();
        let setups = engine.open_setups.clone();

        engine.calculate(&series, series.bars() - 1);

        assert_eq!(engine.active, active);
        assert_eq!(engine.sequential_history, sequential);
        assert_eq!(engine.countdown_history, countdown);
        assert_eq!(engine.open_setups, setups);
    }

    #[test]
    fn stalled_setup_stays_open_indefinitely() {
        // A buy setup forms over the falling leg, then fifty bars that never
        // qualify for its countdown.
        let mut closes = falling_closes(14);
        closes.extend(std::iter::repeat(95.0).take(50));
        let series = series_from_closes(&closes);
        let mut engine = TdEngine::new(SequentialConfig::default());
        run(&mut engine, &series);

        let setup = engine
            .open_setups
            .get(&(3, 12))
            .expect("buy setup still open");
        assert_eq!(
            setup.countdown_bar_number, 2,
            "no qualifying bar since the stall began"
        );
        assert!(setup.last_countdown_bar_index.is_none());
    }

    #[test]
    fn sequential_alert_fires_once_at_the_configured_bar() {
        let config = SequentialConfig {
            alerts: crate::config::AlertSettings {
                on_sequential_bar: 5,
                on_countdown_bar: -1,
            },
            ..SequentialConfig::default()
        };
        let series = series_from_closes(&falling_closes(14));
        let mut engine = TdEngine::with_sink(config, RecordingSink::default());
        run(&mut engine, &series);

        let alerts: Vec<&TdEvent> = engine
            .sink
            .events
            .iter()
            .filter(|e| matches!(e, TdEvent::Alert { .. }))
            .collect();
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0],
            &TdEvent::Alert {
                index: 8,
                direction: TradeDirection::Long,
                countdown: false,
            },
            "bearish count bar 5 lands on bar 8 and argues long"
        );
    }

    #[test]
    fn countdown_alert_fires_with_the_countdown_flag() {
        let config = SequentialConfig {
            alerts: crate::config::AlertSettings {
                on_sequential_bar: -1,
                on_countdown_bar: 3,
            },
            ..SequentialConfig::default()
        };
        // Countdown bars land on 12, 13, 14; bar 14 is examined by the call at 15.
        let series = series_from_closes(&falling_closes(16));
        let mut engine = TdEngine::with_sink(config, RecordingSink::default());
        run(&mut engine, &series);

        let alert = engine
            .sink
            .events
            .iter()
            .find(|e| matches!(e, TdEvent::Alert { .. }))
            .expect("countdown alert fired");
        assert_eq!(
            alert,
            &TdEvent::Alert {
                index: 14,
                direction: TradeDirection::Long,
                countdown: true,
            }
        );
    }
}
