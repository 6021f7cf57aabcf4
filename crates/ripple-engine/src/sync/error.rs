use std::time::Duration;

/// Failure while waiting on a fence.
///
/// Both variants are fatal for the frame loop: the slot being waited on may still
/// be in use by the device, so the frame cannot proceed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenceError {
    #[error("fence wait for value {value} timed out after {waited:?} (completed: {completed})")]
    Timeout {
        value: u64,
        completed: u64,
        waited: Duration,
    },

    #[error("GPU device lost: {reason}")]
    DeviceLost { reason: String },
}
