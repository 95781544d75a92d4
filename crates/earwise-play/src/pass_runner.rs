//! One playthrough of a timeline: preview (playback only) or scoring.
//!
//! Audio and visual cursors sweep the timeline in lockstep with the pass
//! clock, each firing an entry once when `elapsed >= target - advance`. A
//! scoring pass additionally opens input once the count-in is over or the
//! first onset's tolerance window opens, whichever comes first, and runs the
//! miss sweep every tick.

use earwise_judge::{JudgeConfig, JudgeManager, TapOutcome};
use earwise_timing::{GameClock, Timeline};
use earwise_types::{
    ClickCue, CueSink, EngineConfig, FeedbackEvent, FeedbackSink, MarkerCue, PassKind,
};
use log::{debug, trace};

/// Pass state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    /// Built but not started.
    Idle,
    /// Scoring only: count-in clicks playing, input closed until the first
    /// onset can be judged.
    CountIn,
    /// Cursors running; input open on scoring passes.
    Active,
    /// All entries fired and the trailing grace elapsed.
    Finished,
}

/// Lead times and judge tuning for a pass, in microseconds of pass time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassTuning {
    pub audio_advance_us: i64,
    pub visual_advance_us: i64,
    pub judge: JudgeConfig,
    pub trailing_grace_us: i64,
    /// Pass clock speed relative to the frame deltas it is fed.
    pub playback_rate: f64,
}

impl Default for PassTuning {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for PassTuning {
    fn from(config: &EngineConfig) -> Self {
        Self {
            audio_advance_us: config.audio_advance_us,
            visual_advance_us: config.visual_advance_us,
            judge: JudgeConfig {
                hit_window_us: config.hit_window_us,
                judge_offset_us: config.judge_offset_us,
            },
            trailing_grace_us: config.trailing_grace_us,
            playback_rate: config.playback_rate,
        }
    }
}

/// Collaborators a pass writes to.
pub struct PassSinks<'a> {
    pub cues: &'a mut dyn CueSink,
    pub feedback: &'a mut dyn FeedbackSink,
}

pub struct PassRunner {
    kind: PassKind,
    timeline: Timeline,
    tuning: PassTuning,
    clock: GameClock,
    phase: PassPhase,
    audio_cursor: usize,
    visual_cursor: usize,
    /// Present on scoring passes only.
    judge: Option<JudgeManager>,
    input_open_us: i64,
    finish_at_us: i64,
}

impl PassRunner {
    pub fn new(kind: PassKind, timeline: Timeline, tuning: PassTuning) -> Self {
        let last = timeline.last_target_us().unwrap_or(0);
        let (judge, finish_at_us) = match kind {
            PassKind::Preview => (None, last + tuning.trailing_grace_us),
            PassKind::Scoring => {
                let judge = JudgeManager::new(timeline.onset_targets_us(), tuning.judge);
                let settle = tuning.judge.judge_offset_us.max(0) + tuning.judge.hit_window_us;
                (Some(judge), last + settle + tuning.trailing_grace_us)
            }
        };
        let input_open_us = match timeline.onset_targets_us().first() {
            Some(&first) => {
                let window_opens =
                    first + tuning.judge.judge_offset_us - tuning.judge.hit_window_us;
                timeline.count_in_end_us().min(window_opens).max(0)
            }
            None => timeline.count_in_end_us(),
        };
        let mut clock = GameClock::new();
        if tuning.playback_rate != 1.0 {
            clock.set_scale(tuning.playback_rate);
        }
        Self {
            kind,
            timeline,
            tuning,
            clock,
            phase: PassPhase::Idle,
            audio_cursor: 0,
            visual_cursor: 0,
            judge,
            input_open_us,
            finish_at_us,
        }
    }

    /// Enter the first running phase and fire every entry due at time zero.
    pub fn start(&mut self, sinks: &mut PassSinks<'_>) -> PassPhase {
        if self.phase != PassPhase::Idle {
            return self.phase;
        }
        self.phase = if self.kind == PassKind::Scoring && self.input_open_us > 0 {
            PassPhase::CountIn
        } else {
            PassPhase::Active
        };
        debug!(
            "{:?} pass started: {} entries ({} count-in), {:?}",
            self.kind,
            self.timeline.len(),
            self.timeline.count_in(),
            self.phase
        );
        self.step(sinks);
        self.phase
    }

    /// Advance the pass clock by `dt_us` and run everything that became due.
    pub fn tick(&mut self, dt_us: i64, sinks: &mut PassSinks<'_>) -> PassPhase {
        if matches!(self.phase, PassPhase::Idle | PassPhase::Finished) || self.clock.is_paused() {
            return self.phase;
        }
        self.clock.advance(dt_us);
        self.step(sinks);
        self.phase
    }

    fn step(&mut self, sinks: &mut PassSinks<'_>) {
        let now = self.clock.elapsed_us();
        self.fire_cursors(now, sinks);

        if self.phase == PassPhase::CountIn && now >= self.input_open_us {
            self.phase = PassPhase::Active;
            debug!("input open at {now}us");
        }

        if self.phase == PassPhase::Active
            && let Some(judge) = self.judge.as_mut()
        {
            judge.sweep(now, |onset| sinks.feedback.feedback(FeedbackEvent::expired(onset)));
        }

        let len = self.timeline.len();
        if self.audio_cursor == len && self.visual_cursor == len && now >= self.finish_at_us {
            self.phase = PassPhase::Finished;
            debug!("{:?} pass finished at {now}us", self.kind);
        }
    }

    fn fire_cursors(&mut self, now: i64, sinks: &mut PassSinks<'_>) {
        let targets = self.timeline.target_times_us();

        while self.audio_cursor < targets.len()
            && now >= targets[self.audio_cursor] - self.tuning.audio_advance_us
        {
            let index = self.audio_cursor;
            let cue = ClickCue {
                pass: self.kind,
                index,
                accent: self.timeline.is_accent(index),
                count_in: self.timeline.is_count_in(index),
            };
            if !sinks.cues.click(cue) {
                trace!("no click bound for entry {index}, skipped");
            }
            self.audio_cursor += 1;
        }

        while self.visual_cursor < targets.len()
            && now >= targets[self.visual_cursor] - self.tuning.visual_advance_us
        {
            let index = self.visual_cursor;
            let cue = MarkerCue {
                pass: self.kind,
                index,
                count_in: self.timeline.is_count_in(index),
            };
            if !sinks.cues.pulse(cue) {
                trace!("no marker bound for entry {index}, skipped");
            }
            self.visual_cursor += 1;
        }
    }

    /// Judge a tap at the current pass time.
    ///
    /// Returns `None` when input is closed (preview pass, count-in, paused or
    /// finished); the tap is then ignored without feedback.
    pub fn tap(&mut self, sinks: &mut PassSinks<'_>) -> Option<TapOutcome> {
        if !self.input_enabled() {
            return None;
        }
        let now = self.clock.elapsed_us();
        let judge = self.judge.as_mut()?;
        let outcome = judge.tap(now);
        let event = match outcome {
            TapOutcome::Hit {
                onset,
                offset_us,
                tier,
            } => FeedbackEvent::hit(tier, onset, offset_us),
            TapOutcome::Stray => FeedbackEvent::stray(),
        };
        sinks.feedback.feedback(event);
        Some(outcome)
    }

    pub fn input_enabled(&self) -> bool {
        self.kind == PassKind::Scoring && self.phase == PassPhase::Active && !self.clock.is_paused()
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn phase(&self) -> PassPhase {
        self.phase
    }

    pub fn elapsed_us(&self) -> i64 {
        self.clock.elapsed_us()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn judge(&self) -> Option<&JudgeManager> {
        self.judge.as_ref()
    }

    pub fn audio_cursor(&self) -> usize {
        self.audio_cursor
    }

    pub fn visual_cursor(&self) -> usize {
        self.visual_cursor
    }

    /// Pass time at which a scoring pass starts accepting taps.
    pub fn input_open_us(&self) -> i64 {
        self.input_open_us
    }

    /// Earliest pass time at which the pass can finish.
    pub fn finish_at_us(&self) -> i64 {
        self.finish_at_us
    }
}
