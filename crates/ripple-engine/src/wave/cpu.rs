use super::{WaveConstants, WaveKernel, WaveParams, WaveRoles};

/// Reference kernel running the same arithmetic as the compute shaders.
///
/// Used headless and as the oracle the GPU kernel is checked against.
pub struct CpuWaveKernel {
    rows: usize,
    cols: usize,
    constants: WaveConstants,
    buffers: [Vec<f32>; 3],
}

impl CpuWaveKernel {
    pub fn new(params: &WaveParams, constants: WaveConstants) -> Self {
        let cells = params.cell_count();
        Self {
            rows: params.rows as usize,
            cols: params.cols as usize,
            constants,
            buffers: [vec![0.0; cells], vec![0.0; cells], vec![0.0; cells]],
        }
    }

    /// Raw buffer by physical index, regardless of role.
    pub fn buffer(&self, index: usize) -> &[f32] {
        &self.buffers[index]
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }
}

impl WaveKernel for CpuWaveKernel {
    type Recorder = ();
    type Displacement<'a> = &'a [f32];

    fn integrate(&mut self, _: &mut (), roles: WaveRoles) {
        let WaveConstants { k0, k1, k2 } = self.constants;
        let (rows, cols) = (self.rows, self.cols);

        let mut next = std::mem::take(&mut self.buffers[roles.next()]);
        let prev = &self.buffers[roles.prev()];
        let curr = &self.buffers[roles.current()];

        for i in 1..rows - 1 {
            for j in 1..cols - 1 {
                let c = i * cols + j;
                let sum = curr[c - cols] + curr[c + cols] + curr[c - 1] + curr[c + 1];
                next[c] = k0 * prev[c] + k1 * curr[c] + k2 * sum;
            }
        }

        self.buffers[roles.next()] = next;
    }

    fn disturb(&mut self, _: &mut (), roles: WaveRoles, row: u32, col: u32, magnitude: f32) {
        let (row, col) = (row as usize, col as usize);
        let half = 0.5 * magnitude;
        let centre = self.at(row, col);
        let cols = self.cols;

        let curr = &mut self.buffers[roles.current()];
        curr[centre] += magnitude;
        curr[centre - cols] += half;
        curr[centre + cols] += half;
        curr[centre - 1] += half;
        curr[centre + 1] += half;
    }

    fn displacement(&self, roles: WaveRoles) -> &[f32] {
        &self.buffers[roles.current()]
    }

    fn clear(&mut self, _: &mut ()) {
        for b in &mut self.buffers {
            b.fill(0.0);
        }
    }
}
