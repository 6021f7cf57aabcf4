/// Steps executed by one `update()` at most; the rest of the backlog is dropped.
pub const MAX_STEPS_PER_UPDATE: u32 = 8;

/// Fixed time-step accumulator.
///
/// Wall time is accumulated and converted into whole integration steps; the
/// remainder carries over to the next frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepAccumulator {
    step: f32,
    acc: f32,
    max_steps: u32,
}

impl StepAccumulator {
    pub fn new(step: f32) -> Self {
        debug_assert!(step > 0.0);
        Self {
            step,
            acc: 0.0,
            max_steps: MAX_STEPS_PER_UPDATE,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Adds `elapsed` seconds and returns how many steps are due.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        if !(elapsed > 0.0) {
            return 0;
        }

        self.acc += elapsed;

        let mut steps = 0;
        while self.acc >= self.step && steps < self.max_steps {
            self.acc -= self.step;
            steps += 1;
        }

        if self.acc >= self.step {
            log::debug!(
                "wave integrator fell behind; dropping {:.3}s of backlog",
                self.acc - self.acc % self.step
            );
            self.acc %= self.step;
        }

        steps
    }

    /// Time carried over to the next `advance`.
    #[inline]
    pub fn pending(&self) -> f32 {
        self.acc
    }

    pub fn reset(&mut self) {
        self.acc = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_frames_accumulate_into_one_step() {
        let mut s = StepAccumulator::new(0.03);
        assert_eq!(s.advance(0.01), 0);
        assert_eq!(s.advance(0.01), 0);
        assert_eq!(s.advance(0.015), 1);
        assert!((s.pending() - 0.005).abs() < 1e-6);
    }

    #[test]
    fn long_frame_runs_several_steps() {
        let mut s = StepAccumulator::new(0.03);
        assert_eq!(s.advance(0.1), 3);
        assert!((s.pending() - 0.01).abs() < 1e-5);
    }

    #[test]
    fn backlog_beyond_the_cap_is_dropped() {
        let mut s = StepAccumulator::new(0.01).with_max_steps(4);
        assert_eq!(s.advance(1.0), 4);
        assert!(s.pending() < 0.01);
    }

    #[test]
    fn zero_and_negative_elapsed_are_ignored() {
        let mut s = StepAccumulator::new(0.03);
        assert_eq!(s.advance(0.0), 0);
        assert_eq!(s.advance(-1.0), 0);
        assert_eq!(s.advance(f32::NAN), 0);
        assert_eq!(s.pending(), 0.0);
    }
}
