//! Judge manager for scoring passes.
//!
//! Matches taps against the nearest unconsumed onset and retires onsets whose
//! tolerance window has elapsed.

use earwise_types::FeedbackTier;
use log::debug;

use crate::feedback::classify;
use crate::timing_stats::TimingStats;

/// Judge tuning for one pass, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgeConfig {
    /// Largest accepted |tap - adjusted target|.
    pub hit_window_us: i64,
    /// Added to every onset target before matching.
    pub judge_offset_us: i64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            hit_window_us: 150_000,
            judge_offset_us: 0,
        }
    }
}

/// Resolution state of one onset. `Hit` and `Missed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnsetState {
    Pending,
    /// Signed tap offset (negative = early).
    Hit { offset_us: i64 },
    Missed,
}

impl OnsetState {
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Result of judging a single tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// The tap consumed `onset`.
    Hit {
        onset: usize,
        offset_us: i64,
        tier: FeedbackTier,
    },
    /// No unconsumed onset within the hit window. Nothing was marked.
    Stray,
}

/// Onset judgement buffer plus the matching and sweep rules over it.
#[derive(Debug, Clone)]
pub struct JudgeManager {
    config: JudgeConfig,
    /// Onset targets, sorted ascending.
    targets_us: Vec<i64>,
    states: Vec<OnsetState>,
    /// Every onset below this index is resolved.
    first_pending: usize,
    stats: TimingStats,
}

impl JudgeManager {
    /// Create a buffer for the given onset targets (pass-relative, ascending).
    pub fn new(onset_targets_us: &[i64], config: JudgeConfig) -> Self {
        Self {
            config,
            targets_us: onset_targets_us.to_vec(),
            states: vec![OnsetState::Pending; onset_targets_us.len()],
            first_pending: 0,
            stats: TimingStats::default(),
        }
    }

    pub fn config(&self) -> JudgeConfig {
        self.config
    }

    fn adjusted_target(&self, index: usize) -> i64 {
        self.targets_us[index] + self.config.judge_offset_us
    }

    /// Judge a tap at `now_us`.
    ///
    /// Picks the unconsumed onset whose adjusted target is closest to `now_us`,
    /// the lower index winning ties, and accepts it if the distance is within
    /// the hit window (inclusive).
    pub fn tap(&mut self, now_us: i64) -> TapOutcome {
        let mut best: Option<(usize, i64)> = None;
        for i in self.first_pending..self.targets_us.len() {
            if !self.states[i].is_pending() {
                continue;
            }
            let adjusted = self.adjusted_target(i);
            let diff = (now_us - adjusted).abs();
            match best {
                Some((_, best_diff)) if diff >= best_diff => {
                    // Targets ascend, so once past `now` nothing later is closer.
                    if adjusted > now_us {
                        break;
                    }
                }
                _ => best = Some((i, diff)),
            }
        }

        match best {
            Some((onset, diff)) if diff <= self.config.hit_window_us => {
                let offset_us = now_us - self.adjusted_target(onset);
                let tier = classify(diff, self.config.hit_window_us);
                self.states[onset] = OnsetState::Hit { offset_us };
                self.stats.record(tier, offset_us);
                self.advance_first_pending();
                debug!("tap at {now_us}us hit onset {onset} ({offset_us:+}us, {tier:?})");
                TapOutcome::Hit {
                    onset,
                    offset_us,
                    tier,
                }
            }
            _ => {
                debug!("stray tap at {now_us}us");
                TapOutcome::Stray
            }
        }
    }

    /// Mark every pending onset whose window closed before `now_us` as missed.
    ///
    /// `on_miss` is called once per newly missed onset, in index order.
    /// Returns the number of onsets missed by this sweep.
    pub fn sweep(&mut self, now_us: i64, mut on_miss: impl FnMut(usize)) -> usize {
        let mut missed = 0;
        for i in self.first_pending..self.targets_us.len() {
            if !self.states[i].is_pending() {
                continue;
            }
            if now_us > self.adjusted_target(i) + self.config.hit_window_us {
                self.states[i] = OnsetState::Missed;
                missed += 1;
                debug!("onset {i} expired at {now_us}us");
                on_miss(i);
            } else {
                break;
            }
        }
        if missed > 0 {
            self.advance_first_pending();
        }
        missed
    }

    fn advance_first_pending(&mut self) {
        while self.first_pending < self.states.len()
            && !self.states[self.first_pending].is_pending()
        {
            self.first_pending += 1;
        }
    }

    pub fn onset_count(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, index: usize) -> Option<OnsetState> {
        self.states.get(index).copied()
    }

    pub fn states(&self) -> &[OnsetState] {
        &self.states
    }

    pub fn is_hit(&self, index: usize) -> bool {
        matches!(self.state(index), Some(OnsetState::Hit { .. }))
    }

    pub fn is_miss(&self, index: usize) -> bool {
        matches!(self.state(index), Some(OnsetState::Missed))
    }

    /// Absolute timing error of a hit onset.
    pub fn error_us(&self, index: usize) -> Option<i64> {
        match self.state(index) {
            Some(OnsetState::Hit { offset_us }) => Some(offset_us.abs()),
            _ => None,
        }
    }

    pub fn hits(&self) -> usize {
        self.states
            .iter()
            .filter(|s| matches!(s, OnsetState::Hit { .. }))
            .count()
    }

    pub fn misses(&self) -> usize {
        self.states
            .iter()
            .filter(|s| matches!(s, OnsetState::Missed))
            .count()
    }

    pub fn pending(&self) -> usize {
        self.states.len() - self.first_pending
            - self.states[self.first_pending..]
                .iter()
                .filter(|s| !s.is_pending())
                .count()
    }

    pub fn all_resolved(&self) -> bool {
        self.first_pending == self.states.len()
    }

    /// hits / onsets; 0.0 for an empty buffer.
    pub fn hit_ratio(&self) -> f64 {
        if self.states.is_empty() {
            0.0
        } else {
            self.hits() as f64 / self.states.len() as f64
        }
    }

    /// Mean absolute error over hit onsets, or the hit window when nothing
    /// was hit.
    pub fn average_error_us(&self) -> f64 {
        let errors: Vec<i64> = (0..self.states.len()).filter_map(|i| self.error_us(i)).collect();
        if errors.is_empty() {
            self.config.hit_window_us as f64
        } else {
            errors.iter().sum::<i64>() as f64 / errors.len() as f64
        }
    }

    pub fn stats(&self) -> &TimingStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: i64 = 150_000;

    fn manager(targets: &[i64]) -> JudgeManager {
        JudgeManager::new(
            targets,
            JudgeConfig {
                hit_window_us: WINDOW,
                judge_offset_us: 0,
            },
        )
    }

    #[test]
    fn tap_hits_nearest_onset() {
        let mut jm = manager(&[0, 1_000_000, 2_000_000]);
        assert_eq!(
            jm.tap(1_040_000),
            TapOutcome::Hit {
                onset: 1,
                offset_us: 40_000,
                tier: FeedbackTier::Perfect,
            }
        );
        assert!(jm.is_hit(1));
        assert_eq!(jm.error_us(1), Some(40_000));
        assert!(!jm.is_hit(0));
    }

    #[test]
    fn consumed_onset_never_matches_again() {
        let mut jm = manager(&[0, 1_000_000]);
        assert!(matches!(jm.tap(10_000), TapOutcome::Hit { onset: 0, .. }));
        // Second tap near onset 0: onset 1 is too far, so the tap is stray.
        assert_eq!(jm.tap(20_000), TapOutcome::Stray);
        assert_eq!(jm.hits(), 1);
    }

    #[test]
    fn tap_with_nothing_in_range_is_stray() {
        let mut jm = manager(&[1_000_000]);
        assert_eq!(jm.tap(500_000), TapOutcome::Stray);
        assert!(jm.state(0).unwrap().is_pending());

        let mut empty = manager(&[]);
        assert_eq!(empty.tap(0), TapOutcome::Stray);
    }

    #[test]
    fn hit_window_is_inclusive() {
        let mut jm = manager(&[1_000_000]);
        assert!(matches!(
            jm.tap(1_000_000 + WINDOW),
            TapOutcome::Hit {
                tier: FeedbackTier::Ok,
                ..
            }
        ));

        let mut late = manager(&[1_000_000]);
        assert_eq!(late.tap(1_000_000 + WINDOW + 1), TapOutcome::Stray);

        let mut early = manager(&[1_000_000]);
        assert!(matches!(
            early.tap(1_000_000 - WINDOW),
            TapOutcome::Hit { offset_us: -150_000, .. }
        ));
    }

    #[test]
    fn tie_goes_to_lower_index() {
        let mut jm = manager(&[0, 200_000]);
        assert!(matches!(jm.tap(100_000), TapOutcome::Hit { onset: 0, .. }));
        assert!(matches!(jm.tap(100_000), TapOutcome::Hit { onset: 1, .. }));
    }

    #[test]
    fn judge_offset_shifts_targets() {
        let mut jm = JudgeManager::new(
            &[1_000_000],
            JudgeConfig {
                hit_window_us: WINDOW,
                judge_offset_us: 80_000,
            },
        );
        assert!(matches!(
            jm.tap(1_080_000),
            TapOutcome::Hit {
                offset_us: 0,
                tier: FeedbackTier::Perfect,
                ..
            }
        ));
    }

    #[test]
    fn sweep_misses_expired_onsets_once() {
        let mut jm = manager(&[0, 1_000_000, 2_000_000]);
        let mut missed = Vec::new();
        assert_eq!(jm.sweep(WINDOW, |i| missed.push(i)), 0);
        assert_eq!(jm.sweep(WINDOW + 1, |i| missed.push(i)), 1);
        assert_eq!(jm.sweep(5_000_000, |i| missed.push(i)), 2);
        assert_eq!(jm.sweep(6_000_000, |i| missed.push(i)), 0);
        assert_eq!(missed, vec![0, 1, 2]);
        assert!(jm.all_resolved());
        assert_eq!(jm.pending(), 0);
    }

    #[test]
    fn sweep_skips_hit_onsets() {
        let mut jm = manager(&[0, 1_000_000, 2_000_000]);
        jm.tap(1_000_000);
        let mut missed = Vec::new();
        jm.sweep(3_000_000, |i| missed.push(i));
        assert_eq!(missed, vec![0, 2]);
        assert!(jm.is_hit(1));
        assert!(!jm.is_miss(1));
    }

    #[test]
    fn tap_after_sweep_cannot_revive_missed_onset() {
        let mut jm = manager(&[1_000_000]);
        jm.sweep(1_000_000 + WINDOW + 1, |_| {});
        assert_eq!(jm.tap(1_000_000 + WINDOW + 1), TapOutcome::Stray);
        assert!(jm.is_miss(0));
    }

    #[test]
    fn four_quarter_scenario() {
        // 60 BPM quarters, taps at 0.03, 1.05, 2.40, 3.02 with a 0.15 window.
        let mut jm = manager(&[0, 1_000_000, 2_000_000, 3_000_000]);
        jm.tap(30_000);
        jm.sweep(1_050_000, |_| {});
        jm.tap(1_050_000);
        jm.sweep(2_400_000, |_| {});
        assert_eq!(jm.tap(2_400_000), TapOutcome::Stray);
        jm.tap(3_020_000);
        jm.sweep(3_200_000, |_| {});

        assert!(jm.is_hit(0) && jm.is_hit(1) && jm.is_hit(3));
        assert!(jm.is_miss(2));
        assert!((jm.hit_ratio() - 0.75).abs() < 1e-12);
        assert!((jm.average_error_us() - 100_000.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn average_error_falls_back_to_window() {
        let mut jm = manager(&[0, 1_000_000]);
        jm.sweep(2_000_000, |_| {});
        assert_eq!(jm.hits(), 0);
        assert_eq!(jm.average_error_us(), WINDOW as f64);
        assert_eq!(jm.hit_ratio(), 0.0);
    }

    #[test]
    fn counts_add_up() {
        let mut jm = manager(&[0, 500_000, 1_000_000, 1_500_000]);
        jm.tap(0);
        jm.sweep(800_000, |_| {});
        assert_eq!(jm.hits(), 1);
        assert_eq!(jm.misses(), 1);
        assert_eq!(jm.pending(), 2);
        assert!(!jm.all_resolved());
    }
}
