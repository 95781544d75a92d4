use earwise_types::FeedbackTier;
use serde::{Deserialize, Serialize};

/// Timing direction for early/late display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingDirection {
    Early,
    Exact,
    Late,
}

impl TimingDirection {
    const EXACT_THRESHOLD_US: i64 = 1_000;

    /// `offset_us` is tap minus adjusted target (negative = early).
    pub fn from_offset(offset_us: i64) -> Self {
        if offset_us < -Self::EXACT_THRESHOLD_US {
            TimingDirection::Early
        } else if offset_us > Self::EXACT_THRESHOLD_US {
            TimingDirection::Late
        } else {
            TimingDirection::Exact
        }
    }
}

/// Cumulative early/late statistics during a scoring pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingStats {
    pub early: u32,
    pub late: u32,
}

impl TimingStats {
    pub fn record(&mut self, tier: FeedbackTier, offset_us: i64) {
        // Perfect hits are not shown as early/late
        if tier == FeedbackTier::Perfect {
            return;
        }

        match TimingDirection::from_offset(offset_us) {
            TimingDirection::Early => self.early += 1,
            TimingDirection::Late => self.late += 1,
            TimingDirection::Exact => {}
        }
    }
}
