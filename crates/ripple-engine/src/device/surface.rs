use winit::dpi::PhysicalSize;

/// What the frame loop should do after `get_current_texture` fails.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The swapchain was rebuilt; try again next frame.
    Reconfigured,
    /// Drop this frame and carry on.
    SkipFrame,
    /// Stop rendering. Out of memory, or the device behind the surface is gone.
    Fatal,
}

impl SurfaceErrorAction {
    /// Maps a surface error to an action. A lost device turns every error fatal,
    /// since reconfiguring against it cannot succeed.
    pub fn classify(err: &wgpu::SurfaceError, device_lost: bool) -> Self {
        if device_lost {
            return Self::Fatal;
        }
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigured,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => Self::SkipFrame,
        }
    }
}

/// Picks the swapchain format. The composite pass writes straight into it, so
/// any color format works; sRGB is only a preference.
pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = formats.first().copied()?;
    if !prefer_srgb {
        return Some(first);
    }
    Some(formats.iter().copied().find(|f| f.is_srgb()).unwrap_or(first))
}

pub(crate) fn choose_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| modes.contains(m))
        .or_else(|| modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Falls back to FIFO, the one mode every backend must offer.
pub(crate) fn choose_present_mode(
    modes: &[wgpu::PresentMode],
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    let auto = matches!(
        requested,
        wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync
    );
    if auto || modes.contains(&requested) {
        requested
    } else {
        log::warn!("present mode {requested:?} unsupported; using Fifo");
        wgpu::PresentMode::Fifo
    }
}

/// Records `new_size` and reconfigures unless it is empty (minimised window).
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }
    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode as Alpha, PresentMode, SurfaceError, TextureFormat as Tf};

    // ── classify ──────────────────────────────────────────────────────────

    #[test]
    fn outdated_and_lost_reconfigure() {
        assert_eq!(
            SurfaceErrorAction::classify(&SurfaceError::Outdated, false),
            SurfaceErrorAction::Reconfigured
        );
        assert_eq!(
            SurfaceErrorAction::classify(&SurfaceError::Lost, false),
            SurfaceErrorAction::Reconfigured
        );
    }

    #[test]
    fn timeout_skips_and_oom_is_fatal() {
        assert_eq!(
            SurfaceErrorAction::classify(&SurfaceError::Timeout, false),
            SurfaceErrorAction::SkipFrame
        );
        assert_eq!(
            SurfaceErrorAction::classify(&SurfaceError::OutOfMemory, false),
            SurfaceErrorAction::Fatal
        );
    }

    #[test]
    fn lost_device_is_always_fatal() {
        assert_eq!(
            SurfaceErrorAction::classify(&SurfaceError::Outdated, true),
            SurfaceErrorAction::Fatal
        );
    }

    // ── format / mode selection ───────────────────────────────────────────

    #[test]
    fn srgb_preferred_when_offered() {
        let formats = [Tf::Bgra8Unorm, Tf::Bgra8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(Tf::Bgra8UnormSrgb));
        assert_eq!(choose_surface_format(&formats, false), Some(Tf::Bgra8Unorm));
    }

    #[test]
    fn linear_only_surface_still_works() {
        assert_eq!(choose_surface_format(&[Tf::Rgba16Float], true), Some(Tf::Rgba16Float));
        assert_eq!(choose_surface_format(&[], true), None);
    }

    #[test]
    fn unsupported_alpha_falls_back_to_first() {
        let modes = [Alpha::Opaque, Alpha::PreMultiplied];
        assert_eq!(choose_alpha_mode(&modes, Some(Alpha::PostMultiplied)), Alpha::Opaque);
        assert_eq!(choose_alpha_mode(&modes, Some(Alpha::PreMultiplied)), Alpha::PreMultiplied);
        assert_eq!(choose_alpha_mode(&[], None), Alpha::Auto);
    }

    #[test]
    fn unsupported_present_mode_falls_back_to_fifo() {
        let modes = [PresentMode::Fifo];
        assert_eq!(choose_present_mode(&modes, PresentMode::Mailbox), PresentMode::Fifo);
        assert_eq!(choose_present_mode(&modes, PresentMode::AutoNoVsync), PresentMode::AutoNoVsync);
    }
}
