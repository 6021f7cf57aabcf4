use crate::binding::BindingError;

/// Construction-time contract violations and invalid requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaveError {
    #[error("wave grid {rows}x{cols} is too small; both sides must be at least 3")]
    GridTooSmall { rows: u32, cols: u32 },

    #[error("wave grid {rows}x{cols} is not a multiple of the {tile}x{tile} dispatch tile")]
    GridNotTileable { rows: u32, cols: u32, tile: u32 },

    #[error("invalid wave parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("unstable wave parameters: courant number {courant} exceeds {limit}")]
    Unstable { courant: f32, limit: f32 },

    #[error("disturbance at ({row}, {col}) must leave a one-cell border in a {rows}x{cols} grid")]
    DisturbOutOfRange { row: u32, col: u32, rows: u32, cols: u32 },

    #[error(transparent)]
    Binding(#[from] BindingError),
}
