//! Scripted taps for simulated play.
//!
//! Tap times are precomputed per scoring pass from the timeline, optionally
//! jittered and thinned with a seeded RNG, then replayed against the session
//! at exactly the scripted pass time.

use earwise_judge::TapOutcome;
use earwise_timing::Timeline;
use earwise_types::PassKind;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::session::{GameSession, TrialPhase};

/// Autoplay tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoplayConfig {
    /// Uniform jitter applied to every tap, +/- this many microseconds.
    pub jitter_us: i64,
    /// Chance of leaving an onset untapped, in `[0, 1]`.
    pub skip_probability: f64,
    pub seed: u64,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            jitter_us: 0,
            skip_probability: 0.0,
            seed: 0,
        }
    }
}

/// Sorted tap times (pass-relative) consumed in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTaps {
    times_us: Vec<i64>,
    current_index: usize,
}

impl ScriptedTaps {
    pub fn new(mut times_us: Vec<i64>) -> Self {
        times_us.sort_unstable();
        Self {
            times_us,
            current_index: 0,
        }
    }

    /// One tap per onset at its judged target, with jitter and skips drawn
    /// from `rng`.
    pub fn for_timeline(
        timeline: &Timeline,
        judge_offset_us: i64,
        config: &AutoplayConfig,
        rng: &mut StdRng,
    ) -> Self {
        let skip = if config.skip_probability.is_finite() {
            config.skip_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let jitter = config.jitter_us.max(0);
        let mut times_us = Vec::with_capacity(timeline.onset_count());
        for &target in timeline.onset_targets_us() {
            if skip > 0.0 && rng.gen_bool(skip) {
                continue;
            }
            let noise = if jitter > 0 {
                rng.gen_range(-jitter..=jitter)
            } else {
                0
            };
            times_us.push((target + judge_offset_us + noise).max(0));
        }
        Self::new(times_us)
    }

    /// Consume every tap due at or before `now_us`; returns how many.
    pub fn poll_up_to(&mut self, now_us: i64) -> usize {
        let start = self.current_index;
        while let Some(&due) = self.times_us.get(self.current_index) {
            if due > now_us {
                break;
            }
            self.current_index += 1;
        }
        self.current_index - start
    }

    pub fn next_due_us(&self) -> Option<i64> {
        self.times_us.get(self.current_index).copied()
    }

    pub fn len(&self) -> usize {
        self.times_us.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times_us.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.times_us.len() - self.current_index
    }
}

/// Plays a session's scoring passes from generated scripts.
pub struct AutoPlayer {
    config: AutoplayConfig,
    rng: StdRng,
    script: ScriptedTaps,
    /// Trial whose scoring pass `script` was built for.
    scripted_trial: Option<usize>,
    outcomes: Vec<TapOutcome>,
}

impl AutoPlayer {
    pub fn new(config: AutoplayConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            script: ScriptedTaps::default(),
            scripted_trial: None,
            outcomes: Vec::new(),
        }
    }

    /// Advance `session` by `dt_us`, splitting the step so each scripted tap
    /// is delivered at its exact pass time.
    pub fn drive(&mut self, session: &mut GameSession, dt_us: i64) -> TrialPhase {
        let mut remaining = dt_us.max(0);
        loop {
            if session.is_paused() {
                return session.tick(remaining);
            }
            self.sync(session);
            let elapsed = match session.current_pass() {
                Some(pass) if session.phase() == TrialPhase::Scoring => pass.elapsed_us(),
                _ => return session.tick(remaining),
            };
            let Some(due) = self.script.next_due_us() else {
                return session.tick(remaining);
            };
            let step = session.config().wall_us((due - elapsed).max(0));
            if step > remaining {
                return session.tick(remaining);
            }
            let trial = session.trial_index();
            session.tick(step);
            remaining -= step;
            if session.phase() != TrialPhase::Scoring || session.trial_index() != trial {
                self.script = ScriptedTaps::default();
                continue;
            }
            let now = session.current_pass().map_or(due, |p| p.elapsed_us());
            for _ in 0..self.script.poll_up_to(now) {
                if let Some(outcome) = session.tap() {
                    self.outcomes.push(outcome);
                }
            }
        }
    }

    fn sync(&mut self, session: &GameSession) {
        if session.phase() != TrialPhase::Scoring
            || self.scripted_trial == Some(session.trial_index())
        {
            return;
        }
        let Some(pass) = session.current_pass() else {
            return;
        };
        if pass.kind() != PassKind::Scoring {
            return;
        }
        self.script = ScriptedTaps::for_timeline(
            pass.timeline(),
            session.config().judge_offset_us,
            &self.config,
            &mut self.rng,
        );
        self.scripted_trial = Some(session.trial_index());
        debug!(
            "autoplay scripted {} tap(s) for trial {}",
            self.script.len(),
            session.trial_index()
        );
    }

    /// Every judged tap so far.
    pub fn outcomes(&self) -> &[TapOutcome] {
        &self.outcomes
    }
}
