// Tap matching, miss sweep, feedback tiers and early/late statistics

mod feedback;
mod judge_manager;
mod timing_stats;

pub use feedback::{GOOD_WINDOW_US, PERFECT_WINDOW_US, classify};
pub use judge_manager::{JudgeConfig, JudgeManager, OnsetState, TapOutcome};
pub use timing_stats::{TimingDirection, TimingStats};
