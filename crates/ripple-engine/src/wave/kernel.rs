use super::WaveRoles;

/// Executes the per-step work of a wave simulation.
///
/// Work is recorded into `Recorder` (a command encoder on the GPU) and runs in
/// recording order. Implementations own the three wave buffers; `roles` says
/// which one plays which part for the call.
pub trait WaveKernel {
    type Recorder;

    /// Read-only view of the current height field.
    type Displacement<'a>
    where
        Self: 'a;

    /// One integration step: reads prev and curr, writes the interior of next.
    fn integrate(&mut self, rec: &mut Self::Recorder, roles: WaveRoles);

    /// Adds `magnitude` at `(row, col)` and half of it at the four neighbours
    /// of the current buffer. The caller guarantees an interior cell.
    fn disturb(
        &mut self,
        rec: &mut Self::Recorder,
        roles: WaveRoles,
        row: u32,
        col: u32,
        magnitude: f32,
    );

    fn displacement(&self, roles: WaveRoles) -> Self::Displacement<'_>;

    /// Zeroes all three buffers.
    fn clear(&mut self, rec: &mut Self::Recorder);
}
