pub mod core;
pub mod countdown;
pub mod events;
pub mod state;

// Re-export key components
pub use core::TdEngine;
pub use events::{LogSink, NullSink, RecordingSink, TdEvent, TdEventSink};
pub use state::{TdBar, TdReversalSetup};
