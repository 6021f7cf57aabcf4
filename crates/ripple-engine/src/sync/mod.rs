//! CPU/GPU synchronization.
//!
//! A `Fence` is a monotonic counter shared between the single submitting thread
//! and the device:
//! - the submitter reserves values with `next_value()` and `signal()`s them after
//!   recording a frame's work
//! - the device reports completion through a `FenceDriver`
//! - `wait_for()` blocks, bounded by a timeout and by device loss

mod driver;
mod error;
mod fence;

pub use driver::{FenceDriver, ManualFenceDriver, QueueFenceDriver};
pub use error::FenceError;
pub use fence::{Fence, FenceState, DEFAULT_FENCE_TIMEOUT};
