use std::sync::Arc;
use std::time::Duration;

use crate::device::DeviceHealth;

use super::FenceState;

/// Bridges a `Fence` to whatever reports completion.
pub trait FenceDriver {
    /// Arranges for `state` to observe `value` once all work submitted so far has
    /// executed.
    fn signal(&self, value: u64, state: &Arc<FenceState>);

    /// Gives the device up to `budget` to make progress and deliver completions.
    fn pump(&self, budget: Duration);

    /// `Some(reason)` once the device is gone; waits must stop.
    fn lost_reason(&self) -> Option<String>;
}

/// wgpu driver: completion is delivered by `Queue::on_submitted_work_done`.
///
/// On native backends those callbacks only run inside `Device::poll`, so `pump`
/// performs a bounded blocking poll.
pub struct QueueFenceDriver {
    device: wgpu::Device,
    queue: wgpu::Queue,
    health: Arc<DeviceHealth>,
}

impl QueueFenceDriver {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, health: Arc<DeviceHealth>) -> Self {
        Self { device, queue, health }
    }
}

impl FenceDriver for QueueFenceDriver {
    fn signal(&self, value: u64, state: &Arc<FenceState>) {
        let state = Arc::clone(state);
        self.queue.on_submitted_work_done(move || state.complete(value));
    }

    fn pump(&self, budget: Duration) {
        let result = self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(budget),
        });

        match result {
            Ok(_) | Err(wgpu::PollError::Timeout) => {}
            Err(e) => log::warn!("device poll failed: {e}"),
        }
    }

    fn lost_reason(&self) -> Option<String> {
        self.health.lost_reason()
    }
}

/// Driver whose completions are reported by its owner.
///
/// `immediate()` completes every value as soon as it is signalled (CPU-only
/// timelines); `deferred()` leaves completion to whoever holds the fence state.
#[derive(Debug, Clone, Default)]
pub struct ManualFenceDriver {
    immediate: bool,
    health: Arc<DeviceHealth>,
}

impl ManualFenceDriver {
    pub fn immediate() -> Self {
        Self {
            immediate: true,
            health: Arc::default(),
        }
    }

    pub fn deferred() -> Self {
        Self::default()
    }

    pub fn health(&self) -> &Arc<DeviceHealth> {
        &self.health
    }
}

impl FenceDriver for ManualFenceDriver {
    fn signal(&self, value: u64, state: &Arc<FenceState>) {
        if self.immediate {
            state.complete(value);
        }
    }

    fn pump(&self, _budget: Duration) {}

    fn lost_reason(&self) -> Option<String> {
        self.health.lost_reason()
    }
}
