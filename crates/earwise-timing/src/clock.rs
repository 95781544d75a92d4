//! Frame time for the engine.
//!
//! Hosts read a [`TimeProvider`] once per frame through a [`FrameTicker`] and
//! hand the delta to the session; each pass keeps its own [`GameClock`] so
//! pausing or slowing one pass never disturbs the wall-clock reading.

use std::time::Instant;

use earwise_types::PLAYBACK_RATE_RANGE;
use log::warn;

/// Source of frame timestamps, in microseconds from an arbitrary epoch.
pub trait TimeProvider {
    fn now_us(&self) -> i64;
}

/// Monotonic wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeProvider {
    start: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_us(&self) -> i64 {
        i64::try_from(self.start.elapsed().as_micros()).unwrap_or(i64::MAX)
    }
}

impl<T: TimeProvider + ?Sized> TimeProvider for &T {
    fn now_us(&self) -> i64 {
        (**self).now_us()
    }
}

/// Playback-rate bounds for [`GameClock::set_scale`].
pub const MIN_SCALE: f64 = PLAYBACK_RATE_RANGE.0;
pub const MAX_SCALE: f64 = PLAYBACK_RATE_RANGE.1;

/// Pausable, optionally scaled elapsed-time accumulator.
///
/// Elapsed time only moves forward: pause freezes it and negative steps are
/// dropped. Scaled time is derived from the wall time fed since the last
/// scale change, so per-frame rounding never accumulates.
#[derive(Debug, Clone)]
pub struct GameClock {
    base_us: i64,
    fed_us: i64,
    elapsed_us: i64,
    paused: bool,
    scale: f64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            base_us: 0,
            fed_us: 0,
            elapsed_us: 0,
            paused: false,
            scale: 1.0,
        }
    }

    /// Advance by a frame delta. Returns the new elapsed time.
    pub fn advance(&mut self, dt_us: i64) -> i64 {
        if !self.paused && dt_us > 0 {
            self.fed_us += dt_us;
            self.elapsed_us = if self.scale == 1.0 {
                self.base_us + self.fed_us
            } else {
                self.base_us + (self.fed_us as f64 * self.scale).round() as i64
            };
        }
        self.elapsed_us
    }

    pub fn elapsed_us(&self) -> i64 {
        self.elapsed_us
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the playback rate, clamped to [`MIN_SCALE`, `MAX_SCALE`]. Time
    /// already elapsed is kept.
    pub fn set_scale(&mut self, scale: f64) {
        self.base_us = self.elapsed_us;
        self.fed_us = 0;
        self.scale = if scale.is_finite() {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        };
        if self.scale != scale {
            warn!("clock scale {scale} out of range, using {}", self.scale);
        }
    }
}

/// Longest single frame step handed to the engine (250ms).
pub const MAX_FRAME_STEP_US: i64 = 250_000;

/// Turns successive provider readings into per-frame deltas.
pub struct FrameTicker<P: TimeProvider> {
    provider: P,
    last_us: i64,
}

impl<P: TimeProvider> FrameTicker<P> {
    pub fn new(provider: P) -> Self {
        let last_us = provider.now_us();
        Self { provider, last_us }
    }

    /// Delta since the previous call, capped at [`MAX_FRAME_STEP_US`].
    pub fn tick(&mut self) -> i64 {
        let now = self.provider.now_us();
        let dt = (now - self.last_us).clamp(0, MAX_FRAME_STEP_US);
        self.last_us = now;
        dt
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Provider the test moves by hand.
    #[derive(Default)]
    struct SteppedTime(Cell<i64>);

    impl SteppedTime {
        fn step(&self, us: i64) {
            self.0.set(self.0.get() + us);
        }
    }

    impl TimeProvider for SteppedTime {
        fn now_us(&self) -> i64 {
            self.0.get()
        }
    }

    #[test]
    fn system_time_never_goes_back() {
        let time = SystemTimeProvider::new();
        let mut last = time.now_us();
        for _ in 0..100 {
            let now = time.now_us();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn game_clock_pause_freezes_elapsed() {
        let mut clock = GameClock::new();
        clock.advance(16_000);
        clock.pause();
        assert_eq!(clock.advance(500_000), 16_000);
        assert!(clock.is_paused());
        clock.resume();
        assert_eq!(clock.advance(4_000), 20_000);
    }

    #[test]
    fn game_clock_ignores_negative_steps() {
        let mut clock = GameClock::new();
        clock.advance(10_000);
        assert_eq!(clock.advance(-5_000), 10_000);
    }

    #[test]
    fn game_clock_scale() {
        let mut clock = GameClock::new();
        clock.set_scale(0.5);
        assert_eq!(clock.advance(100_000), 50_000);
        clock.set_scale(100.0);
        assert_eq!(clock.scale(), MAX_SCALE);
        assert_eq!(clock.advance(1_000), 54_000);
        clock.set_scale(f64::NAN);
        assert_eq!(clock.scale(), 1.0);
        assert_eq!(clock.advance(1_000), 55_000);
    }

    #[test]
    fn scaled_clock_does_not_drift() {
        let mut clock = GameClock::new();
        clock.set_scale(2.0 / 3.0);
        for _ in 0..3_000 {
            clock.advance(1_001);
        }
        assert_eq!(clock.elapsed_us(), 2_002_000);
    }

    #[test]
    fn frame_ticker_caps_stalls() {
        let time = SteppedTime::default();
        time.step(1_000);
        let mut ticker = FrameTicker::new(&time);
        time.step(16_667);
        assert_eq!(ticker.tick(), 16_667);
        time.step(2_000_000);
        assert_eq!(ticker.tick(), MAX_FRAME_STEP_US);
        assert_eq!(ticker.tick(), 0);
    }
}
