use std::time::{Duration, Instant};

/// Source of monotonic instants.
///
/// The clock never reads `Instant::now()` directly so that tests and replays can
/// drive it deterministically.
pub trait TimeSource {
    fn now(&self) -> Instant;
}

/// Wall-clock time source backed by `Instant::now()`.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Pausable frame clock.
///
/// `tick()` computes the delta since the previous tick; while stopped every tick
/// reports a zero delta. `total_time()` excludes all time spent stopped.
///
/// Single frame deltas are clamped to `max_delta` so that a debugger break or a
/// minimized window does not feed a huge step into fixed-step simulations.
#[derive(Debug, Clone)]
pub struct GameClock<S: TimeSource = SystemTime> {
    source: S,

    base: Instant,
    prev: Instant,
    stopped_at: Option<Instant>,
    paused_total: Duration,

    delta: Duration,
    max_delta: Duration,
    frame_index: u64,
}

impl GameClock<SystemTime> {
    /// Creates a running clock with the default 250 ms delta ceiling.
    pub fn new() -> Self {
        Self::with_source(SystemTime)
    }
}

impl Default for GameClock<SystemTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> GameClock<S> {
    pub fn with_source(source: S) -> Self {
        let now = source.now();
        Self {
            source,
            base: now,
            prev: now,
            stopped_at: None,
            paused_total: Duration::ZERO,
            delta: Duration::ZERO,
            max_delta: Duration::from_millis(250),
            frame_index: 0,
        }
    }

    /// Replaces the per-tick delta ceiling.
    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = max_delta;
        self
    }

    /// Rebases the clock to now and clears the stopped state.
    pub fn reset(&mut self) {
        let now = self.source.now();
        self.base = now;
        self.prev = now;
        self.stopped_at = None;
        self.paused_total = Duration::ZERO;
        self.delta = Duration::ZERO;
        self.frame_index = 0;
    }

    /// Resumes a stopped clock. The stopped interval is excluded from `total_time()`.
    pub fn start(&mut self) {
        let Some(stopped_at) = self.stopped_at.take() else {
            return;
        };

        let now = self.source.now();
        self.paused_total += now.saturating_duration_since(stopped_at);
        self.prev = now;
    }

    /// Freezes the clock at the current instant. No-op when already stopped.
    pub fn stop(&mut self) {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(self.source.now());
        }
    }

    /// Advances the clock by one frame.
    pub fn tick(&mut self) {
        if self.stopped_at.is_some() {
            self.delta = Duration::ZERO;
            return;
        }

        let now = self.source.now();
        // saturating: a backwards read yields zero rather than a negative delta.
        self.delta = now.saturating_duration_since(self.prev).min(self.max_delta);
        self.prev = now;
        self.frame_index = self.frame_index.wrapping_add(1);
    }

    /// Seconds elapsed since `reset()`, excluding stopped intervals.
    pub fn total_time(&self) -> f32 {
        let end = self.stopped_at.unwrap_or_else(|| self.source.now());
        end.saturating_duration_since(self.base)
            .saturating_sub(self.paused_total)
            .as_secs_f32()
    }

    /// Seconds between the two most recent ticks.
    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Number of ticks taken while running.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct ManualTime {
        origin: Instant,
        offset: Rc<Cell<Duration>>,
    }

    impl ManualTime {
        fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Rc::new(Cell::new(Duration::ZERO)),
            }
        }

        fn advance_ms(&self, ms: u64) {
            self.offset.set(self.offset.get() + Duration::from_millis(ms));
        }
    }

    impl TimeSource for ManualTime {
        fn now(&self) -> Instant {
            self.origin + self.offset.get()
        }
    }

    fn clock() -> (GameClock<ManualTime>, ManualTime) {
        let t = ManualTime::new();
        (GameClock::with_source(t.clone()), t)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ── tick ──────────────────────────────────────────────────────────────

    #[test]
    fn tick_reports_elapsed_delta() {
        let (mut c, t) = clock();
        t.advance_ms(16);
        c.tick();
        assert!(approx(c.delta_time(), 0.016));
        t.advance_ms(20);
        c.tick();
        assert!(approx(c.delta_time(), 0.020));
        assert_eq!(c.frame_index(), 2);
    }

    #[test]
    fn tick_clamps_long_stalls() {
        let (mut c, t) = clock();
        t.advance_ms(5_000);
        c.tick();
        assert!(approx(c.delta_time(), 0.25));
    }

    #[test]
    fn delta_is_zero_before_first_tick() {
        let (c, _t) = clock();
        assert_eq!(c.delta_time(), 0.0);
    }

    // ── stop / start ──────────────────────────────────────────────────────

    #[test]
    fn stopped_ticks_report_zero_delta() {
        let (mut c, t) = clock();
        t.advance_ms(10);
        c.tick();
        c.stop();
        for _ in 0..5 {
            t.advance_ms(33);
            c.tick();
            assert_eq!(c.delta_time(), 0.0);
        }
        assert_eq!(c.frame_index(), 1);
    }

    #[test]
    fn total_time_is_frozen_while_stopped() {
        let (mut c, t) = clock();
        t.advance_ms(100);
        c.tick();
        c.stop();
        let frozen = c.total_time();
        t.advance_ms(500);
        c.tick();
        assert_eq!(c.total_time(), frozen);
    }

    #[test]
    fn start_excludes_the_paused_interval() {
        let (mut c, t) = clock();
        t.advance_ms(100);
        c.stop();
        t.advance_ms(1_000);
        c.start();
        t.advance_ms(50);
        c.tick();
        assert!(approx(c.total_time(), 0.150));
        // The first tick after resuming measures from the resume instant.
        assert!(approx(c.delta_time(), 0.050));
    }

    #[test]
    fn start_on_running_clock_is_noop() {
        let (mut c, t) = clock();
        t.advance_ms(40);
        c.start();
        assert!(approx(c.total_time(), 0.040));
    }

    #[test]
    fn total_time_is_non_decreasing_while_running() {
        let (mut c, t) = clock();
        let mut last = c.total_time();
        for ms in [1, 16, 0, 33, 7, 250] {
            t.advance_ms(ms);
            c.tick();
            let now = c.total_time();
            assert!(now >= last);
            last = now;
        }
    }

    // ── reset ─────────────────────────────────────────────────────────────

    #[test]
    fn reset_rebases_and_resumes() {
        let (mut c, t) = clock();
        t.advance_ms(300);
        c.stop();
        t.advance_ms(300);
        c.reset();
        assert!(!c.is_stopped());
        assert_eq!(c.total_time(), 0.0);
        t.advance_ms(10);
        c.tick();
        assert!(approx(c.delta_time(), 0.010));
    }
}
