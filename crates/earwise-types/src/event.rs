use serde::{Deserialize, Serialize};

/// Which kind of pass produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassKind {
    /// Playback only; input is never enabled.
    Preview,
    /// Count-in (optional) followed by an input window that is judged.
    Scoring,
}

/// Feedback grade shown to the player for a tap or an expired onset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackTier {
    Perfect,
    Good,
    Ok,
    Miss,
}

impl FeedbackTier {
    pub fn is_hit(self) -> bool {
        !matches!(self, Self::Miss)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Good => "Good",
            Self::Ok => "Ok",
            Self::Miss => "Miss",
        }
    }
}

/// A single judgement outcome sent to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub tier: FeedbackTier,
    /// Onset the event refers to. `None` for a stray tap that matched nothing.
    pub onset: Option<usize>,
    /// Signed tap offset for hits (negative = early).
    pub offset_us: Option<i64>,
}

impl FeedbackEvent {
    pub fn hit(tier: FeedbackTier, onset: usize, offset_us: i64) -> Self {
        Self {
            tier,
            onset: Some(onset),
            offset_us: Some(offset_us),
        }
    }

    /// An onset whose tolerance window elapsed without a tap.
    pub fn expired(onset: usize) -> Self {
        Self {
            tier: FeedbackTier::Miss,
            onset: Some(onset),
            offset_us: None,
        }
    }

    /// A tap with no unconsumed onset in range. Marks nothing.
    pub fn stray() -> Self {
        Self {
            tier: FeedbackTier::Miss,
            onset: None,
            offset_us: None,
        }
    }
}

/// Audio click request for one timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickCue {
    pub pass: PassKind,
    /// Index into the pass timeline (count-in entries first).
    pub index: usize,
    pub accent: bool,
    pub count_in: bool,
}

/// Visual marker pulse for one timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerCue {
    pub pass: PassKind,
    pub index: usize,
    pub count_in: bool,
}

/// Outcome of one trial's scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_index: usize,
    pub success: bool,
    /// Mean absolute error over hit onsets, seconds. Falls back to the hit
    /// window when nothing was hit.
    pub average_error: f64,
    pub hit_ratio: f64,
    pub hits: usize,
    pub onsets: usize,
    pub early_taps: u32,
    pub late_taps: u32,
}

/// End-of-game totals handed to the progress collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub total_trials: usize,
    pub correct_trials: usize,
    /// Mean of the per-trial average errors, seconds.
    pub mean_error: f64,
    pub trials: Vec<TrialResult>,
}

impl GameSummary {
    pub fn from_trials(trials: Vec<TrialResult>) -> Self {
        let total_trials = trials.len();
        let correct_trials = trials.iter().filter(|t| t.success).count();
        let mean_error = if total_trials == 0 {
            0.0
        } else {
            trials.iter().map(|t| t.average_error).sum::<f64>() / total_trials as f64
        };
        Self {
            total_trials,
            correct_trials,
            mean_error,
            trials,
        }
    }
}
