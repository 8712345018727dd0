//! Countdown advancement for open reversal setups.

use crate::domain::SetupType;
use crate::engine::core::TdEngine;
use crate::engine::events::TdEventSink;
use crate::engine::state::{SetupKey, TdBar};
use crate::models::BarSeries;

impl<S: TdEventSink> TdEngine<S> {
    /// Advance every open setup's countdown against the bar at `index`.
    ///
    /// Completion removes entries, so the registry is walked via a snapshot
    /// of its keys rather than a live iterator.
    pub(crate) fn advance_countdowns<B: BarSeries>(&mut self, series: &B, index: usize) {
        let snapshot: Vec<SetupKey> = self.open_setups.keys().copied().collect();

        for key in snapshot {
            let mut finished = false;

            if let Some(setup) = self.open_setups.get_mut(&key) {
                // Guards a duplicate call for the same bar.
                if setup.last_advance_index == Some(index) {
                    continue;
                }

                let qualifies = match setup.setup_type {
                    SetupType::Buy => {
                        series.value(index) <= series.low(index - 1)
                            && series.value(index) <= series.low(index - 2)
                    }
                    SetupType::Sell => {
                        series.value(index) >= series.high(index - 1)
                            && series.value(index) >= series.high(index - 2)
                    }
                };
                if !qualifies {
                    continue;
                }

                // The closing bar must also reach the bar-8 reference value,
                // otherwise this bar does not qualify and the countdown waits.
                if setup.countdown_bar_number + 1 == self.config.max_countdown_bars {
                    if let Some(eighth) = setup.eighth_countdown_bar_index {
                        let gated = match setup.setup_type {
                            SetupType::Buy => series.low(index) > series.value(eighth),
                            SetupType::Sell => series.high(index) < series.value(eighth),
                        };
                        if gated {
                            continue;
                        }
                    }
                }

                setup.countdown_bar_number += 1;
                setup.last_advance_index = Some(index);
                let number = setup.countdown_bar_number;

                let bar = TdBar {
                    index,
                    number,
                    count_type: setup.setup_type.countdown_polarity(),
                };

                if number == 1 {
                    setup.first_countdown_bar_index = Some(index);
                }
                if number == 8 {
                    setup.eighth_countdown_bar_index = Some(index);
                }
                if number == self.config.max_countdown_bars {
                    // Holds the closing bar count, not its index.
                    setup.last_countdown_bar_index = Some(self.config.max_countdown_bars as usize);
                    finished = true;
                }

                let fire_alert = self.config.alerts.on_countdown_bar == number as i32;
                let direction = setup.setup_type.trade_direction();

                // One archived bar per index; the first recorded wins.
                self.countdown_history.entry(index).or_insert_with(|| bar.clone());
                self.sink.on_countdown_bar(&bar);
                if fire_alert {
                    self.sink.on_alert(index, direction, true);
                }
            }

            if finished {
                self.open_setups.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SequentialConfig;
    use crate::domain::{Candle, PairInterval, SetupType};
    use crate::engine::TdEngine;
    use crate::engine::events::{RecordingSink, TdEvent, TdEventSink};
    use crate::models::OhlcvTimeSeries;

    /// Falling closes with the usual half-point wick, except where a bar's
    /// low is pinned explicitly.
    fn falling_series(bars: usize, pinned_lows: &[(usize, f64)]) -> OhlcvTimeSeries {
        let mut series = OhlcvTimeSeries::new(PairInterval::new("TESTUSDT", 60_000), 0);
        for i in 0..bars {
            let close = 100.0 - i as f64;
            let low = pinned_lows
                .iter()
                .find(|(idx, _)| *idx == i)
                .map(|(_, low)| *low)
                .unwrap_or(close - 0.5);
            series.push_candle(Candle::new(close, close + 0.5, low, close));
        }
        series
    }

    fn run<S: TdEventSink>(engine: &mut TdEngine<S>, series: &OhlcvTimeSeries) {
        for index in engine.config.first_index()..series.bars() {
            engine.calculate(series, index);
        }
    }

    #[test]
    fn countdown_runs_to_thirteen_and_retires_the_setup() {
        // Buy setup spans bars 3..12; its countdown starts on bar 12 and,
        // with every bar qualifying, closes on bar 24.
        let series = falling_series(26, &[]);
        let mut engine = TdEngine::with_sink(SequentialConfig::default(), RecordingSink::default());
        run(&mut engine, &series);

        assert!(
            engine.open_setups.get(&(3, 12)).is_none(),
            "completed setup leaves the registry"
        );

        let closing = engine
            .sink
            .events
            .iter()
            .filter_map(|e| match e {
                TdEvent::CountdownBar { bar } => Some((bar.index, bar.number)),
                _ => None,
            })
            .find(|(_, number)| *number == 13)
            .expect("closing countdown bar recorded");
        assert_eq!(closing.0, 24);

        // Bar 8 of the countdown sat on bar 19, eight qualifying bars after 12.
        let eighth = engine
            .sink
            .events
            .iter()
            .filter_map(|e| match e {
                TdEvent::CountdownBar { bar } if bar.number == 8 => Some(bar.index),
                _ => None,
            })
            .next()
            .unwrap();
        assert_eq!(eighth, 19);
    }

    #[test]
    fn gate_blocks_the_final_countdown_bar() {
        // Identical falling tape, but bar 24's low is pinned above the
        // bar-8 close (close[19] = 81), so the would-be closing bar fails.
        let mut series = falling_series(26, &[(24, 85.0)]);
        let mut engine = TdEngine::new(SequentialConfig::default());
        run(&mut engine, &series);

        let setup = engine
            .open_setups
            .get(&(3, 12))
            .expect("gated setup still open");
        assert_eq!(
            setup.countdown_bar_number, 12,
            "bar 13 must not count while the gate holds"
        );
        assert_eq!(setup.eighth_countdown_bar_index, Some(19));

        // The next qualifying bar trades down through the reference and closes it.
        series.push_candle(Candle::new(74.0, 74.5, 73.5, 74.0));
        engine.calculate(&series, 26);

        assert!(
            engine.open_setups.get(&(3, 12)).is_none(),
            "setup retires once the gate clears"
        );
    }

    #[test]
    fn completion_stores_the_closing_bar_count() {
        // Pin the tape so the first setup completes, then inspect the bar it
        // recorded just before leaving the registry.
        let series = falling_series(26, &[]);
        let mut engine = TdEngine::with_sink(SequentialConfig::default(), RecordingSink::default());

        let mut retired = None;
        for index in engine.config.first_index()..series.bars() {
            let before = engine.open_setups.get(&(3, 12)).cloned();
            engine.calculate(&series, index);
            if let Some(setup) = before {
                if engine.open_setups.get(&(3, 12)).is_none() && retired.is_none() {
                    retired = Some(setup);
                }
            }
        }

        let retired = retired.expect("first setup completed");
        assert_eq!(retired.setup_type, SetupType::Buy);
        assert_eq!(retired.countdown_bar_number, 12, "snapshot from just before the close");

        // The engine archived the closing bar itself.
        assert_eq!(
            engine.countdown_history.get(&24).map(|bar| bar.number),
            Some(13)
        );
    }
}
