use anyhow::Result;

use crate::input::InputEvent;

use super::{FrameCtx, InitCtx, ResizeCtx};

/// Control directive returned by scene hooks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SceneControl {
    Continue,
    Exit,
    /// Stop or restart the game clock.
    TogglePause,
}

/// A demo scene driven by `window::Runtime`.
///
/// Per redraw the runtime calls `update` then `draw`. An `Err` from any hook
/// is fatal and ends the loop.
pub trait Scene {
    /// Called once after the window and device exist.
    fn init(&mut self, ctx: &mut InitCtx<'_, '_>) -> Result<()>;

    fn update(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<SceneControl>;

    /// Records and submits the frame's GPU work and presents it.
    fn draw(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<()>;

    /// Called after the surface was reconfigured to a new non-zero size.
    fn resize(&mut self, ctx: &ResizeCtx<'_>) {
        let _ = ctx;
    }

    fn handle_input(&mut self, event: &InputEvent) -> SceneControl {
        let _ = event;
        SceneControl::Continue
    }
}
