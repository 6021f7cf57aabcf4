use anyhow::{bail, Result};
use winit::window::Window;

use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::input::InputState;
use crate::time::GameClock;

/// Context for `Scene::init`.
pub struct InitCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
}

/// Context for `Scene::resize`. Sizes are physical pixels.
pub struct ResizeCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub width: u32,
    pub height: u32,
}

/// Per-frame context passed to `Scene::update` and `Scene::draw`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub clock: &'a GameClock,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Seconds since the previous tick; zero while paused.
    pub fn delta_time(&self) -> f32 {
        self.clock.delta_time()
    }

    /// Unpaused seconds since the clock was reset.
    pub fn total_time(&self) -> f32 {
        self.clock.total_time()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_stopped()
    }

    /// Acquires the next swapchain image.
    ///
    /// `Ok(None)` means the frame should be skipped (surface lost or outdated
    /// and reconfigured, or a timeout). A fatal surface error is an `Err`.
    pub fn acquire_frame(&mut self) -> Result<Option<GpuFrame>> {
        match self.gpu.acquire_frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(err) => match self.gpu.handle_surface_error(err) {
                SurfaceErrorAction::Fatal => bail!("surface error is fatal"),
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(None),
            },
        }
    }

    /// Presents a frame whose work has already been submitted.
    pub fn present(&self, frame: GpuFrame) {
        self.window.pre_present_notify();
        frame.present();
    }
}
