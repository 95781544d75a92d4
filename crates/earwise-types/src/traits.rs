//! Collaborator interfaces injected into the engine.
//! Implementations: presentation/result layers (production), `EventRecorder` (testing).

use crate::event::{ClickCue, FeedbackEvent, GameSummary, MarkerCue, TrialResult};
use crate::pattern::Pattern;

/// Audio and visual trigger target.
///
/// Methods return `false` when no resource is bound for the cue. The engine
/// treats that as a silent skip and keeps its timeline moving.
pub trait CueSink {
    fn click(&mut self, cue: ClickCue) -> bool;

    fn pulse(&mut self, cue: MarkerCue) -> bool;

    /// Distinct cue announcing the scoring pass (cue-then-beat alignment).
    fn scoring_start(&mut self, _trial_index: usize) -> bool {
        false
    }
}

/// Fire-and-forget judgement feedback for the presentation layer.
pub trait FeedbackSink {
    fn feedback(&mut self, event: FeedbackEvent);
}

/// Progress collaborator receiving trial and game results.
pub trait ResultSink {
    fn trial_ended(&mut self, result: &TrialResult);

    fn game_finished(&mut self, summary: &GameSummary);
}

/// Level-configuration collaborator.
pub trait PatternSource {
    fn patterns(&self) -> Vec<Pattern>;
}

impl PatternSource for Vec<Pattern> {
    fn patterns(&self) -> Vec<Pattern> {
        self.clone()
    }
}

impl PatternSource for [Pattern] {
    fn patterns(&self) -> Vec<Pattern> {
        self.to_vec()
    }
}

/// Sink with nothing bound: every cue is skipped, every event dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl CueSink for NullSink {
    fn click(&mut self, _cue: ClickCue) -> bool {
        false
    }

    fn pulse(&mut self, _cue: MarkerCue) -> bool {
        false
    }
}

impl FeedbackSink for NullSink {
    fn feedback(&mut self, _event: FeedbackEvent) {}
}

impl ResultSink for NullSink {
    fn trial_ended(&mut self, _result: &TrialResult) {}

    fn game_finished(&mut self, _summary: &GameSummary) {}
}
