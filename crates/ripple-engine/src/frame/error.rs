use crate::sync::FenceError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame ring depth must be at least 2, got {depth}")]
    DepthTooSmall { depth: usize },

    #[error("element {index} out of range for upload buffer of {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("upload buffer must hold at least one element")]
    Empty,

    #[error(transparent)]
    Fence(#[from] FenceError),
}
