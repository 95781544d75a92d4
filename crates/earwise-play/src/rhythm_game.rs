use earwise_judge::TapOutcome;
use earwise_types::time::secs_to_us;
use earwise_types::{ConfigError, GameSummary, HIT_WINDOW_RANGE, PatternSource};
use log::warn;

use crate::session::{FinishedCallback, GameSession, TrialPhase};

/// Surface a host controller drives a rhythm mini-game through.
///
/// Setters take effect from the next pass that is built.
pub trait RhythmGame {
    fn configure_patterns(&mut self, source: &dyn PatternSource);

    /// Hit window in seconds, clamped to `[0.05, 0.30]`.
    fn set_hit_window(&mut self, secs: f64) -> Result<(), ConfigError>;

    /// Required hit ratio, clamped to `[0, 1]`.
    fn set_required_ratio(&mut self, ratio: f64) -> Result<(), ConfigError>;

    fn set_total_trials(&mut self, total: u32) -> Result<(), ConfigError>;

    fn on_finished(&mut self, callback: FinishedCallback);

    fn start(&mut self);

    fn tick(&mut self, dt_us: i64) -> TrialPhase;

    fn tap(&mut self) -> Option<TapOutcome>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn cancel(&mut self);

    fn is_finished(&self) -> bool;
}

impl RhythmGame for GameSession {
    fn configure_patterns(&mut self, source: &dyn PatternSource) {
        self.set_patterns(source);
    }

    fn set_hit_window(&mut self, secs: f64) -> Result<(), ConfigError> {
        if !secs.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "hit_window",
                value: secs,
            });
        }
        let (lo, hi) = HIT_WINDOW_RANGE;
        let clamped = secs.clamp(lo, hi);
        if clamped != secs {
            warn!("hit_window {secs} out of range, clamped to {clamped}");
        }
        self.config_mut().hit_window_us = secs_to_us(clamped);
        Ok(())
    }

    fn set_required_ratio(&mut self, ratio: f64) -> Result<(), ConfigError> {
        if !ratio.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "required_hit_ratio",
                value: ratio,
            });
        }
        let clamped = ratio.clamp(0.0, 1.0);
        if clamped != ratio {
            warn!("required_hit_ratio {ratio} out of range, clamped to {clamped}");
        }
        self.config_mut().required_hit_ratio = clamped;
        Ok(())
    }

    fn set_total_trials(&mut self, total: u32) -> Result<(), ConfigError> {
        if total == 0 {
            return Err(ConfigError::NoTrials);
        }
        self.config_mut().total_trials = total;
        Ok(())
    }

    fn on_finished(&mut self, callback: FinishedCallback) {
        self.set_on_finished(callback);
    }

    fn start(&mut self) {
        GameSession::start(self);
    }

    fn tick(&mut self, dt_us: i64) -> TrialPhase {
        GameSession::tick(self, dt_us)
    }

    fn tap(&mut self) -> Option<TapOutcome> {
        GameSession::tap(self)
    }

    fn pause(&mut self) {
        GameSession::pause(self);
    }

    fn resume(&mut self) {
        GameSession::resume(self);
    }

    fn cancel(&mut self) {
        GameSession::cancel(self);
    }

    fn is_finished(&self) -> bool {
        GameSession::is_finished(self)
    }
}
