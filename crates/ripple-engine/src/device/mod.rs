//! wgpu device, queue and window surface.
//!
//! `Gpu` owns the swapchain and watches for device loss, which fence waits
//! consult so they fail instead of blocking forever. `headless` creates a
//! surface-less device for GPU-backed tests.

mod frame;
mod gpu;
pub mod headless;
mod health;
mod init;
mod surface;

pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use health::DeviceHealth;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
