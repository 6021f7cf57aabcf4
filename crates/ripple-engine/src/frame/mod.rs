//! Per-frame resources.
//!
//! The CPU records frame `n` while the GPU may still be executing frames
//! `n-1 .. n-(depth-1)`. Every CPU-written resource the GPU reads therefore lives
//! in one of `depth` slots of a `FrameRing`, and a slot is only handed back to
//! the CPU once the fence value recorded for its previous use has completed.

mod dirty;
mod error;
mod resource;
mod ring;
mod upload;

pub use dirty::DirtyFrames;
pub use error::FrameError;
pub use resource::{FrameResource, FrameResourceDesc};
pub use ring::{FrameRing, FrameSlot, FRAME_RING_DEPTH};
pub use upload::{StagingBlock, UploadBuffer};
