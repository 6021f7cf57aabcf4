use std::time::Duration;

use crate::sync::DEFAULT_FENCE_TIMEOUT;

/// Device and swapchain settings for [`Gpu::new`](super::Gpu::new).
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub prefer_srgb: bool,

    /// Unsupported explicit modes fall back to FIFO.
    pub present_mode: wgpu::PresentMode,

    /// `None` takes the surface's first supported mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Swapchain latency hint. The frame ring already bounds CPU run-ahead,
    /// so this stays small.
    pub desired_maximum_frame_latency: u32,

    /// Longest a fence wait may block before the device is treated as hung.
    pub fence_timeout: Duration,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            fence_timeout: DEFAULT_FENCE_TIMEOUT,
        }
    }
}
