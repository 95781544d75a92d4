use std::fs;
use std::path::Path;

use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::time::secs_to_us;

/// How the first scored onset is lined up after the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnsetAlignment {
    /// Scoring pass opens with `scoring_count_in` clicks.
    #[default]
    CountIn,
    /// A distinct start cue plays, then exactly one beat passes before the
    /// first onset. The scoring count-in is not used.
    CueThenBeat,
}

/// Game configuration as supplied by the host, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub total_trials: u32,
    /// Largest accepted |tap - target|, seconds.
    pub hit_window: f64,
    /// Fraction of onsets that must be hit for a trial to succeed.
    pub required_hit_ratio: f64,
    pub audio_advance: f64,
    pub visual_advance: f64,
    pub judge_offset: f64,
    pub preview_count_in: u32,
    pub scoring_count_in: u32,
    pub alignment: OnsetAlignment,
    pub pattern_repeats: u32,
    pub inter_pass_gap: f64,
    pub inter_trial_gap: f64,
    pub trailing_grace: f64,
    pub max_replays: u32,
    /// Pass tempo relative to the pattern's BPM. Below 1 slows playback and
    /// scoring for practice; gaps stay in wall time.
    pub playback_rate: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_trials: 5,
            hit_window: 0.15,
            required_hit_ratio: 0.75,
            audio_advance: 0.0,
            visual_advance: 0.0,
            judge_offset: 0.0,
            preview_count_in: 0,
            scoring_count_in: 4,
            alignment: OnsetAlignment::CountIn,
            pattern_repeats: 1,
            inter_pass_gap: 1.0,
            inter_trial_gap: 1.5,
            trailing_grace: 0.1,
            max_replays: 1,
            playback_rate: 1.0,
        }
    }
}

pub const HIT_WINDOW_RANGE: (f64, f64) = (0.05, 0.30);
pub const GAP_RANGE: (f64, f64) = (0.0, 3.0);
pub const ADVANCE_RANGE: (f64, f64) = (-0.5, 0.5);
pub const GRACE_RANGE: (f64, f64) = (0.05, 0.15);
pub const PLAYBACK_RATE_RANGE: (f64, f64) = (0.25, 4.0);
pub const MAX_PATTERN_REPEATS: u32 = 16;
/// Upper bound for both count-ins, in beats.
pub const MAX_COUNT_IN: u32 = 16;

fn finite(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn clamp_count(field: &str, value: u32) -> u32 {
    let clamped = value.min(MAX_COUNT_IN);
    if clamped != value {
        warn!("{field} {value} out of range, clamped to {clamped}");
    }
    clamped
}

fn clamp_logged(field: &str, value: f64, (lo, hi): (f64, f64)) -> f64 {
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        warn!("{field} {value} out of range, clamped to {clamped}");
    }
    clamped
}

impl GameConfig {
    /// Loads config from a path, or defaults if the file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Clamp every tunable into range and convert to engine units.
    pub fn validate(&self) -> Result<EngineConfig, ConfigError> {
        if self.total_trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        let hit_window = finite("hit_window", self.hit_window)?;
        let ratio = finite("required_hit_ratio", self.required_hit_ratio)?;
        let audio_advance = finite("audio_advance", self.audio_advance)?;
        let visual_advance = finite("visual_advance", self.visual_advance)?;
        let judge_offset = finite("judge_offset", self.judge_offset)?;
        let inter_pass_gap = finite("inter_pass_gap", self.inter_pass_gap)?;
        let inter_trial_gap = finite("inter_trial_gap", self.inter_trial_gap)?;
        let trailing_grace = finite("trailing_grace", self.trailing_grace)?;
        let playback_rate = finite("playback_rate", self.playback_rate)?;

        let repeats = self.pattern_repeats.clamp(1, MAX_PATTERN_REPEATS);
        if repeats != self.pattern_repeats {
            warn!(
                "pattern_repeats {} out of range, clamped to {repeats}",
                self.pattern_repeats
            );
        }

        let hit_window = clamp_logged("hit_window", hit_window, HIT_WINDOW_RANGE);
        let audio_advance = clamp_logged("audio_advance", audio_advance, ADVANCE_RANGE);
        let visual_advance = clamp_logged("visual_advance", visual_advance, ADVANCE_RANGE);
        let judge_offset = clamp_logged("judge_offset", judge_offset, ADVANCE_RANGE);
        let inter_pass_gap = clamp_logged("inter_pass_gap", inter_pass_gap, GAP_RANGE);
        let inter_trial_gap = clamp_logged("inter_trial_gap", inter_trial_gap, GAP_RANGE);
        let trailing_grace = clamp_logged("trailing_grace", trailing_grace, GRACE_RANGE);
        let playback_rate = clamp_logged("playback_rate", playback_rate, PLAYBACK_RATE_RANGE);

        Ok(EngineConfig {
            total_trials: self.total_trials,
            hit_window_us: secs_to_us(hit_window),
            required_hit_ratio: clamp_logged("required_hit_ratio", ratio, (0.0, 1.0)),
            audio_advance_us: secs_to_us(audio_advance),
            visual_advance_us: secs_to_us(visual_advance),
            judge_offset_us: secs_to_us(judge_offset),
            preview_count_in: clamp_count("preview_count_in", self.preview_count_in),
            scoring_count_in: clamp_count("scoring_count_in", self.scoring_count_in),
            alignment: self.alignment,
            pattern_repeats: repeats,
            inter_pass_gap_us: secs_to_us(inter_pass_gap),
            inter_trial_gap_us: secs_to_us(inter_trial_gap),
            trailing_grace_us: secs_to_us(trailing_grace),
            max_replays: self.max_replays,
            playback_rate,
        })
    }
}

/// Validated configuration in microseconds, ready for the engine.
///
/// `Default` matches `GameConfig::default().validate()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub total_trials: u32,
    pub hit_window_us: i64,
    pub required_hit_ratio: f64,
    pub audio_advance_us: i64,
    pub visual_advance_us: i64,
    pub judge_offset_us: i64,
    pub preview_count_in: u32,
    pub scoring_count_in: u32,
    pub alignment: OnsetAlignment,
    pub pattern_repeats: u32,
    pub inter_pass_gap_us: i64,
    pub inter_trial_gap_us: i64,
    pub trailing_grace_us: i64,
    pub max_replays: u32,
    pub playback_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            total_trials: 5,
            hit_window_us: 150_000,
            required_hit_ratio: 0.75,
            audio_advance_us: 0,
            visual_advance_us: 0,
            judge_offset_us: 0,
            preview_count_in: 0,
            scoring_count_in: 4,
            alignment: OnsetAlignment::CountIn,
            pattern_repeats: 1,
            inter_pass_gap_us: 1_000_000,
            inter_trial_gap_us: 1_500_000,
            trailing_grace_us: 100_000,
            max_replays: 1,
            playback_rate: 1.0,
        }
    }
}

impl EngineConfig {
    /// Count-in beats the scoring pass opens with under the configured alignment.
    pub fn effective_scoring_count_in(&self) -> u32 {
        match self.alignment {
            OnsetAlignment::CountIn => self.scoring_count_in,
            OnsetAlignment::CueThenBeat => 0,
        }
    }

    /// Wall time needed for a pass clock to cover `pass_us`, rounded up.
    pub fn wall_us(&self, pass_us: i64) -> i64 {
        if self.playback_rate == 1.0 {
            pass_us
        } else {
            (pass_us as f64 / self.playback_rate).ceil() as i64
        }
    }
}
