//! Recording sink for tests. Enabled with the `test-support` feature.

use std::cell::RefCell;
use std::rc::Rc;

use crate::event::{ClickCue, FeedbackEvent, GameSummary, MarkerCue, TrialResult};
use crate::traits::{CueSink, FeedbackSink, ResultSink};

/// Everything an engine sent to its collaborators, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    Click(ClickCue),
    Pulse(MarkerCue),
    ScoringStart(usize),
    Feedback(FeedbackEvent),
    TrialEnded(TrialResult),
    GameFinished(GameSummary),
}

/// Cloneable recorder; all clones share one event log.
#[derive(Debug, Clone)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
    resources_bound: bool,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self {
            events: Rc::default(),
            resources_bound: true,
        }
    }

    /// A recorder whose cue methods report missing resources.
    pub fn without_resources() -> Self {
        Self {
            events: Rc::default(),
            resources_bound: false,
        }
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn clicks(&self) -> Vec<ClickCue> {
        self.filter(|e| match e {
            RecordedEvent::Click(c) => Some(*c),
            _ => None,
        })
    }

    pub fn pulses(&self) -> Vec<MarkerCue> {
        self.filter(|e| match e {
            RecordedEvent::Pulse(c) => Some(*c),
            _ => None,
        })
    }

    pub fn feedback(&self) -> Vec<FeedbackEvent> {
        self.filter(|e| match e {
            RecordedEvent::Feedback(f) => Some(*f),
            _ => None,
        })
    }

    pub fn trial_results(&self) -> Vec<TrialResult> {
        self.filter(|e| match e {
            RecordedEvent::TrialEnded(r) => Some(r.clone()),
            _ => None,
        })
    }

    pub fn summaries(&self) -> Vec<GameSummary> {
        self.filter(|e| match e {
            RecordedEvent::GameFinished(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn scoring_starts(&self) -> Vec<usize> {
        self.filter(|e| match e {
            RecordedEvent::ScoringStart(t) => Some(*t),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&RecordedEvent) -> Option<T>) -> Vec<T> {
        self.events.borrow().iter().filter_map(f).collect()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CueSink for EventRecorder {
    fn click(&mut self, cue: ClickCue) -> bool {
        self.push(RecordedEvent::Click(cue));
        self.resources_bound
    }

    fn pulse(&mut self, cue: MarkerCue) -> bool {
        self.push(RecordedEvent::Pulse(cue));
        self.resources_bound
    }

    fn scoring_start(&mut self, trial_index: usize) -> bool {
        self.push(RecordedEvent::ScoringStart(trial_index));
        self.resources_bound
    }
}

impl FeedbackSink for EventRecorder {
    fn feedback(&mut self, event: FeedbackEvent) {
        self.push(RecordedEvent::Feedback(event));
    }
}

impl ResultSink for EventRecorder {
    fn trial_ended(&mut self, result: &TrialResult) {
        self.push(RecordedEvent::TrialEnded(result.clone()));
    }

    fn game_finished(&mut self, summary: &GameSummary) {
        self.push(RecordedEvent::GameFinished(summary.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PassKind;

    #[test]
    fn clones_share_the_log() {
        let recorder = EventRecorder::new();
        let mut sink = recorder.clone();
        assert!(sink.click(ClickCue {
            pass: PassKind::Preview,
            index: 0,
            accent: true,
            count_in: false,
        }));
        FeedbackSink::feedback(&mut sink, FeedbackEvent::stray());
        assert_eq!(recorder.clicks().len(), 1);
        assert_eq!(recorder.feedback(), vec![FeedbackEvent::stray()]);
        recorder.clear();
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn without_resources_reports_skips() {
        let mut sink = EventRecorder::without_resources();
        assert!(!sink.pulse(MarkerCue {
            pass: PassKind::Scoring,
            index: 2,
            count_in: false,
        }));
        assert_eq!(sink.pulses().len(), 1);
    }
}
