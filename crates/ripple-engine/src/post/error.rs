use crate::binding::BindingError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PostEffectError {
    #[error("post effect targets need a non-zero extent (got {width}x{height})")]
    ZeroExtent { width: u32, height: u32 },

    #[error("cannot composite into {format:?}")]
    UnsupportedFormat { format: wgpu::TextureFormat },

    #[error(transparent)]
    Binding(#[from] BindingError),
}
