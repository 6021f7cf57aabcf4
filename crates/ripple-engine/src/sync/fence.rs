use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::{FenceDriver, FenceError};

/// Upper bound on a single `wait_for` call before it reports `FenceError::Timeout`.
pub const DEFAULT_FENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest time the waiter sleeps between device-loss checks.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Completed-value cell shared with driver callbacks.
///
/// Completion notifications may arrive on any thread and in any order; the
/// observed value only ever moves forward.
#[derive(Debug, Default)]
pub struct FenceState {
    completed: Mutex<u64>,
    cond: Condvar,
}

impl FenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest value the device has confirmed.
    pub fn completed(&self) -> u64 {
        *self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records that all work up to `value` has executed.
    pub fn complete(&self, value: u64) {
        let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        if value > *completed {
            *completed = value;
            self.cond.notify_all();
        }
    }

    /// Blocks until `value` is reached or `timeout` elapses. Returns the observed value.
    fn wait_timeout(&self, value: u64, timeout: Duration) -> u64 {
        let guard = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |completed| *completed < value)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Monotonic CPU/GPU fence.
///
/// Values start at 1; 0 means "never submitted" and is always complete.
/// Reservation takes `&mut self`: there is exactly one submitter.
pub struct Fence<D: FenceDriver> {
    driver: D,
    state: Arc<FenceState>,
    last_reserved: u64,
    timeout: Duration,
}

impl<D: FenceDriver> Fence<D> {
    pub fn new(driver: D) -> Self {
        Self::with_timeout(driver, DEFAULT_FENCE_TIMEOUT)
    }

    pub fn with_timeout(driver: D, timeout: Duration) -> Self {
        Self {
            driver,
            state: Arc::new(FenceState::new()),
            last_reserved: 0,
            timeout,
        }
    }

    /// Reserves the next submission value. Values are strictly increasing with no gaps.
    pub fn next_value(&mut self) -> u64 {
        self.last_reserved += 1;
        self.last_reserved
    }

    /// Most recently reserved value (0 before the first reservation).
    #[inline]
    pub fn last_reserved(&self) -> u64 {
        self.last_reserved
    }

    /// Asks the driver to complete `value` once all previously submitted work is done.
    ///
    /// Must be called after the submission it tags.
    pub fn signal(&self, value: u64) {
        debug_assert!(value <= self.last_reserved, "signalled an unreserved fence value");
        self.driver.signal(value, &self.state);
    }

    /// Reserves and signals in one step; returns the signalled value.
    pub fn signal_next(&mut self) -> u64 {
        let value = self.next_value();
        self.signal(value);
        value
    }

    #[inline]
    pub fn completed_value(&self) -> u64 {
        self.state.completed()
    }

    #[inline]
    pub fn is_complete(&self, value: u64) -> bool {
        self.completed_value() >= value
    }

    /// Blocks until `value` is complete.
    ///
    /// Fails fast when the driver reports device loss, and with `Timeout` once the
    /// configured bound elapses.
    pub fn wait_for(&self, value: u64) -> Result<(), FenceError> {
        if self.is_complete(value) {
            return Ok(());
        }

        let started = Instant::now();
        let deadline = started + self.timeout;

        loop {
            if let Some(reason) = self.driver.lost_reason() {
                log::error!("fence wait for {value} aborted: device lost ({reason})");
                return Err(FenceError::DeviceLost { reason });
            }

            let now = Instant::now();
            if now >= deadline {
                let completed = self.completed_value();
                log::error!(
                    "fence wait for {value} timed out after {:?} (completed {completed})",
                    self.timeout
                );
                return Err(FenceError::Timeout {
                    value,
                    completed,
                    waited: now - started,
                });
            }

            let slice = (deadline - now).min(WAIT_SLICE);
            self.driver.pump(slice);

            if self.state.wait_timeout(value, slice) >= value {
                return Ok(());
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Shared completion state; drivers and external observers may hold it.
    pub fn state(&self) -> &Arc<FenceState> {
        &self.state
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ManualFenceDriver;
    use std::thread;

    fn deferred(timeout_ms: u64) -> Fence<ManualFenceDriver> {
        Fence::with_timeout(ManualFenceDriver::deferred(), Duration::from_millis(timeout_ms))
    }

    // ── reservation ───────────────────────────────────────────────────────

    #[test]
    fn next_value_is_strictly_increasing_without_gaps() {
        let mut f = deferred(10);
        let values: Vec<u64> = (0..100).map(|_| f.next_value()).collect();
        assert_eq!(values.first(), Some(&1));
        assert!(values.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn zero_is_always_complete() {
        let f = deferred(10);
        assert!(f.is_complete(0));
        assert_eq!(f.wait_for(0), Ok(()));
    }

    // ── completion ────────────────────────────────────────────────────────

    #[test]
    fn completed_value_never_decreases() {
        let state = FenceState::new();
        state.complete(5);
        state.complete(3);
        assert_eq!(state.completed(), 5);
    }

    #[test]
    fn immediate_driver_completes_on_signal() {
        let mut f = Fence::new(ManualFenceDriver::immediate());
        let v = f.signal_next();
        assert!(f.is_complete(v));
        assert_eq!(f.wait_for(v), Ok(()));
    }

    #[test]
    fn deferred_driver_leaves_value_pending() {
        let mut f = deferred(10);
        let v = f.signal_next();
        assert!(!f.is_complete(v));
        assert_eq!(f.completed_value(), 0);
    }

    // ── waiting ───────────────────────────────────────────────────────────

    #[test]
    fn wait_times_out_instead_of_hanging() {
        let mut f = deferred(30);
        let v = f.signal_next();
        match f.wait_for(v) {
            Err(FenceError::Timeout { value, completed, waited }) => {
                assert_eq!(value, v);
                assert_eq!(completed, 0);
                assert!(waited >= Duration::from_millis(30));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn wait_wakes_on_completion_from_another_thread() {
        let mut f = deferred(2_000);
        let v = f.signal_next();
        let state = Arc::clone(f.state());

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            state.complete(v);
        });

        assert_eq!(f.wait_for(v), Ok(()));
        worker.join().unwrap();
    }

    #[test]
    fn wait_fails_fast_on_device_loss() {
        let driver = ManualFenceDriver::deferred();
        let health = driver.health().clone();
        let mut f = Fence::with_timeout(driver, Duration::from_secs(30));
        let v = f.signal_next();

        health.mark_lost("test reset");

        let started = Instant::now();
        let err = f.wait_for(v).unwrap_err();
        assert!(matches!(err, FenceError::DeviceLost { .. }));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
