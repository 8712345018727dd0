use crate::domain::{CountType, SetupType};

/// Ordering key for the open-setup registry: the sequential span that
/// spawned the setup.
pub type SetupKey = (usize, usize);

/// A single numbered count bar.
///
/// Created when a count starts or advances. Once a later bar supersedes it
/// the old value is archived and never mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct TdBar {
    /// Bar index in the price series
    pub index: usize,
    /// 1-based position within its count (sequential 1..9, countdown 1..13)
    pub number: u32,
    /// Polarity of the count this bar belongs to
    pub count_type: CountType,
}

/// A candidate reversal context spawned by a completed sequential count.
///
/// Mutated bar-by-bar while its countdown runs, and removed from the open
/// registry only when the countdown completes. There is no cancellation
/// path: a stalled setup stays open indefinitely.
#[derive(Debug, Clone, PartialEq)]
pub struct TdReversalSetup {
    pub setup_type: SetupType,
    pub first_sequential_bar_index: usize,
    pub last_sequential_bar_index: usize,
    /// Set when countdown bar 1 is recorded
    pub first_countdown_bar_index: Option<usize>,
    /// Set on completion. Holds the closing bar count, not its index.
    pub last_countdown_bar_index: Option<usize>,
    /// Current countdown progress, 0 until the first qualifying bar
    pub countdown_bar_number: u32,
    /// Bar-8 index, the reference for the closing-bar gate
    pub eighth_countdown_bar_index: Option<usize>,
    /// Last series index this countdown advanced on. Guards duplicate
    /// Calculate calls against double counting.
    pub(crate) last_advance_index: Option<usize>,
}

impl TdReversalSetup {
    pub fn new(setup_type: SetupType, first: usize, last: usize) -> Self {
        Self {
            setup_type,
            first_sequential_bar_index: first,
            last_sequential_bar_index: last,
            first_countdown_bar_index: None,
            last_countdown_bar_index: None,
            countdown_bar_number: 0,
            eighth_countdown_bar_index: None,
            last_advance_index: None,
        }
    }

    pub fn key(&self) -> SetupKey {
        (
            self.first_sequential_bar_index,
            self.last_sequential_bar_index,
        )
    }
}
