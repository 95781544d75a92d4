use std::fs;
use std::path::Path;

use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::time::US_PER_MINUTE;
use crate::traits::PatternSource;

/// Slowest tempo the engine accepts.
pub const MIN_BPM: u32 = 20;

/// Fastest tempo the engine accepts.
pub const MAX_BPM: u32 = 300;

/// One note or rest in a pattern, measured in beats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub beats: f64,
    #[serde(default)]
    pub rest: bool,
}

impl Segment {
    pub fn note(beats: f64) -> Self {
        Self { beats, rest: false }
    }

    pub fn rest(beats: f64) -> Self {
        Self { beats, rest: true }
    }

    fn is_valid(&self) -> bool {
        self.beats.is_finite() && self.beats > 0.0
    }
}

/// A musical passage: a tempo plus an ordered run of notes and rests.
///
/// Onsets are the starts of the non-rest segments. A pattern is read-only
/// once a trial has been built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub bpm: u32,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Pattern {
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm,
            segments: Vec::new(),
        }
    }

    /// Append a sounding segment.
    pub fn note(mut self, beats: f64) -> Self {
        self.segments.push(Segment::note(beats));
        self
    }

    /// Append a silent segment.
    pub fn rest(mut self, beats: f64) -> Self {
        self.segments.push(Segment::rest(beats));
        self
    }

    /// Built-in fallback: one bar of four quarter notes at 80 BPM.
    pub fn default_bar() -> Self {
        Self::new(80).note(1.0).note(1.0).note(1.0).note(1.0)
    }

    pub fn onset_count(&self) -> usize {
        self.segments.iter().filter(|s| !s.rest).count()
    }

    pub fn total_beats(&self) -> f64 {
        self.segments.iter().map(|s| s.beats).sum()
    }

    /// Length of one beat in microseconds at this pattern's (clamped) tempo.
    pub fn beat_interval_us(&self) -> i64 {
        US_PER_MINUTE / i64::from(self.bpm.clamp(MIN_BPM, MAX_BPM))
    }

    /// Copy of this pattern with the tempo clamped and invalid segments dropped.
    pub fn sanitized(&self) -> Self {
        let bpm = self.bpm.clamp(MIN_BPM, MAX_BPM);
        if bpm != self.bpm {
            warn!("pattern bpm {} clamped to {}", self.bpm, bpm);
        }
        let segments: Vec<Segment> = self
            .segments
            .iter()
            .copied()
            .filter(Segment::is_valid)
            .collect();
        let dropped = self.segments.len() - segments.len();
        if dropped > 0 {
            warn!("dropped {dropped} segment(s) with non-positive duration");
        }
        Self { bpm, segments }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::default_bar()
    }
}

/// A named list of patterns, usually one level's worth, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSet {
    pub name: String,
    pub patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(name: impl Into<String>, patterns: Vec<Pattern>) -> Self {
        Self {
            name: name.into(),
            patterns,
        }
    }

    /// Loads a pattern set from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let set = serde_json::from_str(&content)?;
        Ok(set)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl PatternSource for PatternSet {
    fn patterns(&self) -> Vec<Pattern> {
        self.patterns.clone()
    }
}
