// Pattern model, engine configuration, outbound events and collaborator traits

mod config;
mod error;
mod event;
mod pattern;
pub mod time;
mod traits;

#[cfg(any(test, feature = "test-support"))]
mod recorder;

pub use config::{
    ADVANCE_RANGE, EngineConfig, GAP_RANGE, GRACE_RANGE, GameConfig, HIT_WINDOW_RANGE,
    MAX_COUNT_IN, MAX_PATTERN_REPEATS, OnsetAlignment, PLAYBACK_RATE_RANGE,
};
pub use error::ConfigError;
pub use event::{
    ClickCue, FeedbackEvent, FeedbackTier, GameSummary, MarkerCue, PassKind, TrialResult,
};
pub use pattern::{MAX_BPM, MIN_BPM, Pattern, PatternSet, Segment};
pub use traits::{CueSink, FeedbackSink, NullSink, PatternSource, ResultSink};

#[cfg(any(test, feature = "test-support"))]
pub use recorder::{EventRecorder, RecordedEvent};
