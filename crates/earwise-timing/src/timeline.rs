use earwise_types::time::US_PER_MINUTE;
use earwise_types::{MAX_BPM, MIN_BPM, Pattern};
use log::debug;

/// Absolute target times for one pass, count-in clicks first.
///
/// Entries `[0, count_in)` are count-in clicks; the rest map 1:1, in order,
/// onto the pattern's onsets. Built fresh for every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    target_times_us: Vec<i64>,
    accents: Vec<bool>,
    count_in: usize,
    count_in_end_us: i64,
    beat_interval_us: i64,
}

impl Timeline {
    /// Build a timeline for one playthrough of `pattern`.
    pub fn build(pattern: &Pattern, count_in_beats: u32) -> Self {
        Self::build_repeated(pattern, count_in_beats, 1)
    }

    /// Build a timeline with the pattern laid end to end `repeats` times.
    ///
    /// Times are derived from the running beat position, so rounding never
    /// accumulates across a long pattern.
    pub fn build_repeated(pattern: &Pattern, count_in_beats: u32, repeats: u32) -> Self {
        let bpm = pattern.bpm.clamp(MIN_BPM, MAX_BPM);
        let us_per_beat = US_PER_MINUTE as f64 / f64::from(bpm);
        let at = |beats: f64| (beats * us_per_beat).round() as i64;

        let count_in = count_in_beats as usize;
        let repeats = repeats.max(1);
        let capacity = count_in + pattern.onset_count() * repeats as usize;
        let mut target_times_us = Vec::with_capacity(capacity);
        let mut accents = Vec::with_capacity(capacity);

        for i in 0..count_in {
            target_times_us.push(at(i as f64));
            accents.push(i == 0);
        }

        let mut cursor = f64::from(count_in_beats);
        for _ in 0..repeats {
            let mut first_onset = true;
            for segment in &pattern.segments {
                if !segment.rest {
                    target_times_us.push(at(cursor));
                    accents.push(first_onset);
                    first_onset = false;
                }
                if segment.beats.is_finite() && segment.beats > 0.0 {
                    cursor += segment.beats;
                }
            }
        }

        debug!(
            "timeline: {} entries ({count_in} count-in) at {bpm} bpm x{repeats}",
            target_times_us.len()
        );
        Self {
            target_times_us,
            accents,
            count_in,
            count_in_end_us: at(f64::from(count_in_beats)),
            beat_interval_us: US_PER_MINUTE / i64::from(bpm),
        }
    }

    pub fn len(&self) -> usize {
        self.target_times_us.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target_times_us.is_empty()
    }

    pub fn count_in(&self) -> usize {
        self.count_in
    }

    pub fn onset_count(&self) -> usize {
        self.target_times_us.len() - self.count_in
    }

    pub fn target_times_us(&self) -> &[i64] {
        &self.target_times_us
    }

    pub fn target_us(&self, index: usize) -> Option<i64> {
        self.target_times_us.get(index).copied()
    }

    pub fn is_accent(&self, index: usize) -> bool {
        self.accents.get(index).copied().unwrap_or(false)
    }

    pub fn is_count_in(&self, index: usize) -> bool {
        index < self.count_in
    }

    /// Target times of the onsets only.
    pub fn onset_targets_us(&self) -> &[i64] {
        &self.target_times_us[self.count_in..]
    }

    /// Time at which the count-in is over and input opens.
    pub fn count_in_end_us(&self) -> i64 {
        self.count_in_end_us
    }

    pub fn last_target_us(&self) -> Option<i64> {
        self.target_times_us.last().copied()
    }

    pub fn beat_interval_us(&self) -> i64 {
        self.beat_interval_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarters(bpm: u32, n: usize) -> Pattern {
        let mut p = Pattern::new(bpm);
        for _ in 0..n {
            p = p.note(1.0);
        }
        p
    }

    #[test]
    fn four_quarters_at_60_bpm() {
        let t = Timeline::build(&quarters(60, 4), 0);
        assert_eq!(
            t.target_times_us(),
            &[0, 1_000_000, 2_000_000, 3_000_000]
        );
        assert_eq!(t.count_in(), 0);
        assert_eq!(t.onset_count(), 4);
        assert_eq!(t.beat_interval_us(), 1_000_000);
    }

    #[test]
    fn count_in_precedes_onsets() {
        let t = Timeline::build(&quarters(120, 2), 4);
        assert_eq!(
            t.target_times_us(),
            &[0, 500_000, 1_000_000, 1_500_000, 2_000_000, 2_500_000]
        );
        assert_eq!(t.count_in_end_us(), 2_000_000);
        assert_eq!(t.onset_targets_us(), &[2_000_000, 2_500_000]);
        assert!(t.is_count_in(3));
        assert!(!t.is_count_in(4));
    }

    #[test]
    fn rests_extend_gaps() {
        let p = Pattern::new(60).note(1.0).rest(1.0).note(0.5).note(0.5).rest(2.0).note(1.0);
        let t = Timeline::build(&p, 0);
        assert_eq!(
            t.target_times_us(),
            &[0, 2_000_000, 2_500_000, 5_000_000]
        );
    }

    #[test]
    fn leading_rest_shifts_first_onset() {
        let p = Pattern::new(60).rest(1.5).note(1.0);
        let t = Timeline::build(&p, 2);
        assert_eq!(t.target_times_us(), &[0, 1_000_000, 3_500_000]);
    }

    #[test]
    fn zero_onsets_yields_count_in_only() {
        let p = Pattern::new(60).rest(4.0);
        let t = Timeline::build(&p, 3);
        assert_eq!(t.len(), 3);
        assert_eq!(t.onset_count(), 0);
        assert!(t.onset_targets_us().is_empty());

        let empty = Timeline::build(&Pattern::new(60), 0);
        assert!(empty.is_empty());
        assert_eq!(empty.last_target_us(), None);
    }

    #[test]
    fn accents_on_first_count_in_and_each_repetition() {
        let p = Pattern::new(60).note(1.0).note(1.0).rest(1.0);
        let t = Timeline::build_repeated(&p, 2, 3);
        // count-in: 0, 1s; reps start at 2s, 5s, 8s
        assert_eq!(
            t.target_times_us(),
            &[
                0, 1_000_000, 2_000_000, 3_000_000, 5_000_000, 6_000_000, 8_000_000, 9_000_000
            ]
        );
        let accents: Vec<bool> = (0..t.len()).map(|i| t.is_accent(i)).collect();
        assert_eq!(
            accents,
            vec![true, false, true, false, true, false, true, false]
        );
        assert!(!t.is_accent(99));
    }

    #[test]
    fn no_drift_on_long_patterns() {
        // 70 BPM does not divide a minute evenly; each entry is still
        // within half a microsecond of its exact position.
        let t = Timeline::build(&quarters(70, 500), 0);
        let exact = 60_000_000.0 / 70.0;
        for (i, &time) in t.target_times_us().iter().enumerate() {
            assert!((time as f64 - i as f64 * exact).abs() <= 0.5);
        }
    }

    #[test]
    fn bpm_below_minimum_is_clamped() {
        let t = Timeline::build(&quarters(1, 2), 0);
        assert_eq!(t.target_times_us(), &[0, 3_000_000]);
    }
}
