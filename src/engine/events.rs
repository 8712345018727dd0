use crate::domain::{FlipType, TradeDirection};
use crate::engine::state::{TdBar, TdReversalSetup};

/// Synchronous observer for engine transitions.
///
/// Hooks are invoked mid-update, in transition order, and must not call
/// back into the engine. The engine never reads anything back from a sink,
/// so a sink cannot corrupt counting state.
pub trait TdEventSink {
    fn on_alert(&mut self, _index: usize, _direction: TradeDirection, _countdown: bool) {}
    fn on_perfect_setup(&mut self, _setup: &TdReversalSetup) {}
    fn on_price_flip(&mut self, _index: usize, _flip: FlipType) {}
    fn on_sequential_bar(&mut self, _bar: &TdBar) {}
    fn on_countdown_bar(&mut self, _bar: &TdBar) {}
}

/// Discards every event. The engine default.
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl TdEventSink for NullSink {}

/// One recorded engine transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TdEvent {
    Alert {
        index: usize,
        direction: TradeDirection,
        countdown: bool,
    },
    PerfectSetup {
        setup: TdReversalSetup,
    },
    PriceFlip {
        index: usize,
        flip: FlipType,
    },
    SequentialBar {
        bar: TdBar,
    },
    CountdownBar {
        bar: TdBar,
    },
}

/// Buffers events for later inspection (used by the monitor and the tests).
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<TdEvent>,
}

impl RecordingSink {
    pub fn drain(&mut self) -> Vec<TdEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TdEventSink for RecordingSink {
    fn on_alert(&mut self, index: usize, direction: TradeDirection, countdown: bool) {
        self.events.push(TdEvent::Alert {
            index,
            direction,
            countdown,
        });
    }

    fn on_perfect_setup(&mut self, setup: &TdReversalSetup) {
        self.events.push(TdEvent::PerfectSetup {
            setup: setup.clone(),
        });
    }

    fn on_price_flip(&mut self, index: usize, flip: FlipType) {
        self.events.push(TdEvent::PriceFlip { index, flip });
    }

    fn on_sequential_bar(&mut self, bar: &TdBar) {
        self.events.push(TdEvent::SequentialBar { bar: bar.clone() });
    }

    fn on_countdown_bar(&mut self, bar: &TdBar) {
        self.events.push(TdEvent::CountdownBar { bar: bar.clone() });
    }
}

/// Logs transitions as they happen. Handy when driving the engine from a binary.
#[derive(Debug, Default, Clone)]
pub struct LogSink {
    pub pair_name: String,
}

impl LogSink {
    pub fn for_pair(pair_name: impl Into<String>) -> Self {
        Self {
            pair_name: pair_name.into(),
        }
    }
}

impl TdEventSink for LogSink {
    fn on_alert(&mut self, index: usize, direction: TradeDirection, countdown: bool) {
        let phase = if countdown { "countdown" } else { "sequential" };
        log::info!(
            "[{}] 🔔 {} alert at bar {} ({})",
            self.pair_name,
            phase,
            index,
            direction
        );
    }

    fn on_perfect_setup(&mut self, setup: &TdReversalSetup) {
        log::info!(
            "[{}] 🎯 Perfect {} setup over bars {}..{}",
            self.pair_name,
            setup.setup_type,
            setup.first_sequential_bar_index,
            setup.last_sequential_bar_index
        );
    }

    fn on_price_flip(&mut self, index: usize, flip: FlipType) {
        if flip != FlipType::None {
            log::debug!("[{}] price flip {:?} at bar {}", self.pair_name, flip, index);
        }
    }

    fn on_sequential_bar(&mut self, bar: &TdBar) {
        log::debug!(
            "[{}] sequential {:?} {} at bar {}",
            self.pair_name,
            bar.count_type,
            bar.number,
            bar.index
        );
    }

    fn on_countdown_bar(&mut self, bar: &TdBar) {
        log::debug!(
            "[{}] countdown {:?} {} at bar {}",
            self.pair_name,
            bar.count_type,
            bar.number,
            bar.index
        );
    }
}
