//! Trial and game sequencing.
//!
//! A game runs `total_trials` trials. Each trial is a preview pass, an
//! inter-pass gap, an optional scoring cue, a scoring pass and an
//! inter-trial gap. Every wait is a timer field driven by `tick`, so the same
//! session runs under a real-time loop, simulated time or an async task.

use earwise_judge::TapOutcome;
use earwise_timing::{Timeline, US_PER_SECOND};
use earwise_types::{
    ConfigError, CueSink, EngineConfig, FeedbackSink, GameConfig, GameSummary, NullSink,
    OnsetAlignment, PassKind, Pattern, PatternSource, ResultSink, TrialResult,
};
use log::{debug, info, trace, warn};

use crate::pass_runner::{PassPhase, PassRunner, PassSinks, PassTuning};

/// Trial-level state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    Idle,
    Preview,
    /// Waiting `inter_pass_gap`. Replay requests are accepted here.
    PreviewGap,
    /// Cue-then-beat alignment: scoring cue played, waiting one beat.
    ScoringCue,
    Scoring,
    /// Waiting `inter_trial_gap` before the next preview.
    TrialGap,
    Finished,
    Cancelled,
}

/// External collaborators owned by a session.
pub struct Collaborators {
    pub cues: Box<dyn CueSink>,
    pub feedback: Box<dyn FeedbackSink>,
    pub results: Box<dyn ResultSink>,
}

impl Collaborators {
    pub fn new(
        cues: impl CueSink + 'static,
        feedback: impl FeedbackSink + 'static,
        results: impl ResultSink + 'static,
    ) -> Self {
        Self {
            cues: Box::new(cues),
            feedback: Box::new(feedback),
            results: Box::new(results),
        }
    }

    /// Nothing bound; every event is dropped.
    pub fn silent() -> Self {
        Self::new(NullSink, NullSink, NullSink)
    }

    fn pass_sinks(&mut self) -> PassSinks<'_> {
        PassSinks {
            cues: self.cues.as_mut(),
            feedback: self.feedback.as_mut(),
        }
    }
}

pub type FinishedCallback = Box<dyn FnMut(&GameSummary)>;

pub struct GameSession {
    config: EngineConfig,
    patterns: Vec<Pattern>,
    sinks: Collaborators,
    phase: TrialPhase,
    trial_index: usize,
    /// Pattern of the trial in progress.
    current: Pattern,
    pass: Option<PassRunner>,
    wait_remaining_us: i64,
    paused: bool,
    replays_used: u32,
    results: Vec<TrialResult>,
    summary: Option<GameSummary>,
    on_finished: Option<FinishedCallback>,
}

/// Sanitize, drop patterns without onsets, and fall back to the default bar.
fn prepare_patterns(source: Vec<Pattern>) -> Vec<Pattern> {
    let supplied = source.len();
    let patterns: Vec<Pattern> = source
        .iter()
        .map(Pattern::sanitized)
        .filter(|p| p.onset_count() > 0)
        .collect();
    if patterns.len() < supplied {
        warn!(
            "dropped {} pattern(s) without onsets",
            supplied - patterns.len()
        );
    }
    if patterns.is_empty() {
        warn!("no playable patterns supplied, using the default bar");
        return vec![Pattern::default_bar()];
    }
    patterns
}

impl GameSession {
    pub fn new<S: PatternSource + ?Sized>(
        config: EngineConfig,
        source: &S,
        sinks: Collaborators,
    ) -> Self {
        let patterns = prepare_patterns(source.patterns());
        let current = patterns[0].clone();
        Self {
            config,
            patterns,
            sinks,
            phase: TrialPhase::Idle,
            trial_index: 0,
            current,
            pass: None,
            wait_remaining_us: 0,
            paused: false,
            replays_used: 0,
            results: Vec::new(),
            summary: None,
            on_finished: None,
        }
    }

    /// Validate a host configuration and build a session from it.
    pub fn from_config<S: PatternSource + ?Sized>(
        config: &GameConfig,
        source: &S,
        sinks: Collaborators,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(config.validate()?, source, sinks))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Replace the pattern list. A trial already in progress keeps its pattern.
    pub fn set_patterns<S: PatternSource + ?Sized>(&mut self, source: &S) {
        self.patterns = prepare_patterns(source.patterns());
    }

    pub fn set_on_finished(&mut self, callback: FinishedCallback) {
        self.on_finished = Some(callback);
    }

    /// Begin the first trial. Ignored unless the session is idle.
    pub fn start(&mut self) {
        if self.phase != TrialPhase::Idle {
            debug!("start ignored in {:?}", self.phase);
            return;
        }
        info!(
            "game started: {} trial(s), {} pattern(s)",
            self.config.total_trials,
            self.patterns.len()
        );
        self.begin_trial(0);
    }

    /// Advance the session by a frame delta. Frozen while paused.
    ///
    /// Time left over when a pass or wait ends within the frame carries into
    /// the next phase.
    pub fn tick(&mut self, dt_us: i64) -> TrialPhase {
        if self.paused {
            return self.phase;
        }
        let mut budget = dt_us.max(0);
        loop {
            match self.phase {
                TrialPhase::Idle | TrialPhase::Finished | TrialPhase::Cancelled => break,
                TrialPhase::Preview | TrialPhase::Scoring => {
                    let Some(pass) = self.pass.as_mut() else {
                        break;
                    };
                    let mut sinks = self.sinks.pass_sinks();
                    if pass.tick(budget, &mut sinks) != PassPhase::Finished {
                        break;
                    }
                    let overshoot = (pass.elapsed_us() - pass.finish_at_us()).max(0);
                    budget = self.config.wall_us(overshoot).min(budget);
                    self.on_pass_finished();
                }
                TrialPhase::PreviewGap | TrialPhase::ScoringCue | TrialPhase::TrialGap => {
                    if budget < self.wait_remaining_us {
                        self.wait_remaining_us -= budget;
                        break;
                    }
                    budget -= self.wait_remaining_us;
                    self.wait_remaining_us = 0;
                    self.on_wait_elapsed();
                }
            }
        }
        self.phase
    }

    /// Deliver a tap. Only judged while a scoring pass has input open.
    pub fn tap(&mut self) -> Option<TapOutcome> {
        if self.paused || self.phase != TrialPhase::Scoring {
            trace!("tap ignored in {:?}", self.phase);
            return None;
        }
        let pass = self.pass.as_mut()?;
        let mut sinks = self.sinks.pass_sinks();
        pass.tap(&mut sinks)
    }

    /// Hear the preview again. Only honoured during the inter-pass gap and
    /// at most `max_replays` times per trial.
    pub fn request_replay(&mut self) -> bool {
        if self.paused
            || self.phase != TrialPhase::PreviewGap
            || self.replays_used >= self.config.max_replays
        {
            debug!("replay refused in {:?}", self.phase);
            return false;
        }
        self.replays_used += 1;
        debug!(
            "trial {} preview replay {}/{}",
            self.trial_index, self.replays_used, self.config.max_replays
        );
        self.start_preview();
        true
    }

    pub fn pause(&mut self) {
        if self.paused || self.is_finished() {
            return;
        }
        self.paused = true;
        if let Some(pass) = self.pass.as_mut() {
            pass.pause();
        }
        debug!("paused in {:?}", self.phase);
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if let Some(pass) = self.pass.as_mut() {
            pass.resume();
        }
        debug!("resumed in {:?}", self.phase);
    }

    /// Stop the game. The active pass and every pending wait are dropped;
    /// nothing fires afterwards and no summary is emitted.
    pub fn cancel(&mut self) {
        if self.is_finished() {
            return;
        }
        info!("game cancelled during trial {} ({:?})", self.trial_index, self.phase);
        self.pass = None;
        self.wait_remaining_us = 0;
        self.phase = TrialPhase::Cancelled;
    }

    /// True once the game finished or was cancelled.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, TrialPhase::Finished | TrialPhase::Cancelled)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn trial_index(&self) -> usize {
        self.trial_index
    }

    pub fn current_pass(&self) -> Option<&PassRunner> {
        self.pass.as_ref()
    }

    /// Pattern of the trial in progress (or the next one while idle).
    pub fn current_pattern(&self) -> &Pattern {
        &self.current
    }

    pub fn wait_remaining_us(&self) -> i64 {
        self.wait_remaining_us
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    fn begin_trial(&mut self, trial_index: usize) {
        self.trial_index = trial_index;
        self.current = self.patterns[trial_index % self.patterns.len()].clone();
        self.replays_used = 0;
        info!(
            "trial {}/{} started: {} bpm, {} onset(s)",
            trial_index + 1,
            self.config.total_trials,
            self.current.bpm,
            self.current.onset_count()
        );
        self.start_preview();
    }

    fn start_preview(&mut self) {
        let timeline = Timeline::build_repeated(
            &self.current,
            self.config.preview_count_in,
            self.config.pattern_repeats,
        );
        self.start_pass(PassKind::Preview, timeline);
        self.phase = TrialPhase::Preview;
    }

    fn start_scoring(&mut self) {
        let timeline = Timeline::build_repeated(
            &self.current,
            self.config.effective_scoring_count_in(),
            self.config.pattern_repeats,
        );
        self.start_pass(PassKind::Scoring, timeline);
        self.phase = TrialPhase::Scoring;
    }

    fn start_pass(&mut self, kind: PassKind, timeline: Timeline) {
        let mut pass = PassRunner::new(kind, timeline, PassTuning::from(&self.config));
        let mut sinks = self.sinks.pass_sinks();
        pass.start(&mut sinks);
        self.pass = Some(pass);
    }

    fn wait(&mut self, phase: TrialPhase, duration_us: i64) {
        debug!("{phase:?} for {duration_us}us");
        self.phase = phase;
        self.wait_remaining_us = duration_us.max(0);
    }

    fn on_pass_finished(&mut self) {
        match self.phase {
            TrialPhase::Preview => {
                self.pass = None;
                self.wait(TrialPhase::PreviewGap, self.config.inter_pass_gap_us);
            }
            TrialPhase::Scoring => {
                self.finish_trial();
                if self.trial_index + 1 >= self.config.total_trials as usize {
                    self.finish_game();
                } else {
                    self.wait(TrialPhase::TrialGap, self.config.inter_trial_gap_us);
                }
            }
            _ => {}
        }
    }

    fn on_wait_elapsed(&mut self) {
        match self.phase {
            TrialPhase::PreviewGap => match self.config.alignment {
                OnsetAlignment::CountIn => self.start_scoring(),
                OnsetAlignment::CueThenBeat => {
                    if !self.sinks.cues.scoring_start(self.trial_index) {
                        trace!("no scoring cue bound, skipped");
                    }
                    let beat = self.config.wall_us(self.current.beat_interval_us());
                    self.wait(TrialPhase::ScoringCue, beat);
                }
            },
            TrialPhase::ScoringCue => self.start_scoring(),
            TrialPhase::TrialGap => self.begin_trial(self.trial_index + 1),
            _ => {}
        }
    }

    fn finish_trial(&mut self) {
        let Some(pass) = self.pass.take() else {
            return;
        };
        let Some(judge) = pass.judge() else {
            return;
        };
        let hit_ratio = judge.hit_ratio();
        let stats = judge.stats();
        let result = TrialResult {
            trial_index: self.trial_index,
            success: hit_ratio >= self.config.required_hit_ratio,
            average_error: judge.average_error_us() / US_PER_SECOND as f64,
            hit_ratio,
            hits: judge.hits(),
            onsets: judge.onset_count(),
            early_taps: stats.early,
            late_taps: stats.late,
        };
        info!(
            "trial {} ended: {}/{} hit ({:.0}%), avg error {:.3}s, {}",
            self.trial_index + 1,
            result.hits,
            result.onsets,
            hit_ratio * 100.0,
            result.average_error,
            if result.success { "success" } else { "fail" }
        );
        self.sinks.results.trial_ended(&result);
        self.results.push(result);
    }

    fn finish_game(&mut self) {
        let summary = GameSummary::from_trials(self.results.clone());
        info!(
            "game finished: {}/{} trials correct, mean error {:.3}s",
            summary.correct_trials, summary.total_trials, summary.mean_error
        );
        self.phase = TrialPhase::Finished;
        self.sinks.results.game_finished(&summary);
        if let Some(callback) = self.on_finished.as_mut() {
            callback(&summary);
        }
        self.summary = Some(summary);
    }
}
