// Counting analysis and signal monitoring
pub mod monitor;
pub mod perfect_setup;
pub mod price_flip;

// Re-export commonly used types
pub use monitor::{PairSequentialContext, SequentialMonitor, SignalKind, TdSignal};
pub use perfect_setup::is_perfect_setup;
pub use price_flip::detect_flip;
