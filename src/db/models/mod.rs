pub mod calls;
pub mod mouse;
pub mod stats;

pub use calls::{AppCallStats, CallObservation, CallStats};
pub use mouse::MouseMetric;
pub use stats::{HeatmapPoint, KeyCount, KpmStats, MouseStats, Stats, TimePoint, TypingStats};
