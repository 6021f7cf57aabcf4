//! Surface-less device creation for tests and offline tools.

/// Requests a device without a surface.
///
/// Returns `None` when the machine exposes no usable adapter; callers treat that
/// as "GPU unavailable" rather than as an error.
pub async fn request_device(label: &str) -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok()?;

    let info = adapter.get_info();
    log::debug!("headless adapter: {} ({:?})", info.name, info.backend);

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .ok()
}

/// Blocking wrapper around [`request_device`].
pub fn request_device_blocking(label: &str) -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(request_device(label))
}
