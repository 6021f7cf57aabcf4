//! Contracts between the runtime and the scenes it drives.
//!
//! A scene never sees the event loop. The runtime calls its `Scene` hooks in
//! a fixed order and passes a context with the GPU, input and clock.

mod ctx;
mod scene;

pub use ctx::{FrameCtx, InitCtx, ResizeCtx};
pub use scene::{Scene, SceneControl};
