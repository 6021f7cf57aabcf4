use super::{
    CpuWaveKernel, DisturbanceConfig, DisturbanceSchedule, GpuWaveKernel, StepAccumulator,
    WaveConstants, WaveError, WaveKernel, WaveParams, WaveRoles,
};

/// Fixed-step wave simulation over three rotating buffers.
///
/// `update` turns wall time into whole integration steps and rotates buffer
/// roles after each one. The displacement map follows the rotation, so fetch
/// it again after every `update` instead of holding on to it.
pub struct WaveSimulation<K: WaveKernel> {
    params: WaveParams,
    constants: WaveConstants,
    kernel: K,
    roles: WaveRoles,
    stepper: StepAccumulator,
    ripples: Option<DisturbanceSchedule>,
    steps: u64,
}

impl WaveSimulation<CpuWaveKernel> {
    pub fn cpu(params: WaveParams) -> Result<Self, WaveError> {
        let constants = params.validate()?;
        let kernel = CpuWaveKernel::new(&params, constants);
        Ok(Self::from_kernel(params, constants, kernel))
    }
}

impl WaveSimulation<GpuWaveKernel> {
    pub fn gpu(device: &wgpu::Device, params: WaveParams) -> Result<Self, WaveError> {
        let constants = params.validate()?;
        let kernel = GpuWaveKernel::new(device, &params, constants)?;
        Ok(Self::from_kernel(params, constants, kernel))
    }
}

impl<K: WaveKernel> WaveSimulation<K> {
    pub fn from_kernel(params: WaveParams, constants: WaveConstants, kernel: K) -> Self {
        log::info!(
            "wave simulation {}x{}: dt={} courant={:.3} K0={:.5} K1={:.5} K2={:.5}",
            params.rows,
            params.cols,
            params.dt,
            params.courant(),
            constants.k0,
            constants.k1,
            constants.k2
        );
        Self {
            params,
            constants,
            kernel,
            roles: WaveRoles::default(),
            stepper: StepAccumulator::new(params.dt),
            ripples: None,
            steps: 0,
        }
    }

    /// Enables periodic random impulses during `update`.
    pub fn with_ripples(mut self, config: DisturbanceConfig) -> Result<Self, WaveError> {
        self.ripples = Some(DisturbanceSchedule::new(config)?);
        Ok(self)
    }

    pub fn set_ripples_enabled(&mut self, enabled: bool) {
        if let Some(r) = &mut self.ripples {
            r.set_enabled(enabled);
        }
    }

    /// Advances by `elapsed` seconds of wall time; returns the integration steps run.
    ///
    /// A due ripple is recorded before the steps of this call.
    pub fn update(&mut self, rec: &mut K::Recorder, elapsed: f32) -> u32 {
        let (rows, cols) = (self.params.rows, self.params.cols);
        if let Some(d) = self.ripples.as_mut().and_then(|r| r.poll(elapsed, rows, cols)) {
            self.kernel.disturb(rec, self.roles, d.row, d.col, d.magnitude);
        }

        let steps = self.stepper.advance(elapsed);
        for _ in 0..steps {
            self.step(rec);
        }
        steps
    }

    /// Runs exactly one integration step regardless of the accumulator.
    pub fn step(&mut self, rec: &mut K::Recorder) {
        self.kernel.integrate(rec, self.roles);
        self.roles.rotate();
        self.steps += 1;
    }

    /// Adds an impulse to the current buffer. Needs a one-cell border around
    /// `(row, col)` so that all four neighbours exist.
    pub fn disturb(
        &mut self,
        rec: &mut K::Recorder,
        row: u32,
        col: u32,
        magnitude: f32,
    ) -> Result<(), WaveError> {
        let (rows, cols) = (self.params.rows, self.params.cols);
        if row < 1 || col < 1 || row + 2 > rows || col + 2 > cols {
            return Err(WaveError::DisturbOutOfRange { row, col, rows, cols });
        }
        self.kernel.disturb(rec, self.roles, row, col, magnitude);
        Ok(())
    }

    /// Current height field. Invalidated by the next `update` or `step`.
    pub fn displacement_map(&self) -> K::Displacement<'_> {
        self.kernel.displacement(self.roles)
    }

    /// Zeroes the surface and restarts the accumulators.
    pub fn reset(&mut self, rec: &mut K::Recorder) {
        self.kernel.clear(rec);
        self.roles = WaveRoles::default();
        self.stepper.reset();
        self.steps = 0;
    }

    #[inline]
    pub fn roles(&self) -> WaveRoles {
        self.roles
    }

    /// Integration steps run since construction or the last `reset`.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn params(&self) -> &WaveParams {
        &self.params
    }

    #[inline]
    pub fn constants(&self) -> WaveConstants {
        self.constants
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> WaveSimulation<CpuWaveKernel> {
        WaveSimulation::cpu(WaveParams::default()).unwrap()
    }

    fn cell(map: &[f32], cols: u32, row: u32, col: u32) -> f32 {
        map[(row * cols + col) as usize]
    }

    // ── stepping ──────────────────────────────────────────────────────────

    #[test]
    fn update_runs_whole_steps_and_rotates() {
        let mut s = sim();
        assert_eq!(s.update(&mut (), 0.01), 0);
        assert_eq!(s.roles(), WaveRoles::default());

        assert_eq!(s.update(&mut (), 0.07), 2);
        assert_eq!(s.steps(), 2);
        let mut expected = WaveRoles::default();
        expected.rotate();
        expected.rotate();
        assert_eq!(s.roles(), expected);
    }

    #[test]
    fn still_water_stays_still() {
        let mut s = sim();
        s.update(&mut (), 1.0);
        assert!(s.displacement_map().iter().all(|&h| h == 0.0));
    }

    // ── disturbances ──────────────────────────────────────────────────────

    #[test]
    fn disturb_then_one_step_stays_local() {
        let mut s = sim();
        let cols = s.params().cols;
        let (i, j) = (100, 37);

        s.disturb(&mut (), i, j, 1.0).unwrap();
        assert_eq!(s.update(&mut (), 0.03), 1);

        let map = s.displacement_map();
        assert_ne!(cell(map, cols, i, j), 0.0);
        for row in 0..s.params().rows {
            for col in 0..cols {
                let distance = row.abs_diff(i) + col.abs_diff(j);
                if distance > 2 {
                    assert_eq!(cell(map, cols, row, col), 0.0, "({row}, {col})");
                }
            }
        }
    }

    #[test]
    fn disturb_spreads_half_magnitude_to_neighbours() {
        let mut s = sim();
        let cols = s.params().cols;
        s.disturb(&mut (), 5, 5, 2.0).unwrap();

        let map = s.displacement_map();
        assert_eq!(cell(map, cols, 5, 5), 2.0);
        for (r, c) in [(4, 5), (6, 5), (5, 4), (5, 6)] {
            assert_eq!(cell(map, cols, r, c), 1.0);
        }
        assert_eq!(cell(map, cols, 4, 4), 0.0);
    }

    #[test]
    fn disturb_rejects_edge_cells() {
        let mut s = sim();
        for (r, c) in [(0, 5), (5, 0), (255, 5), (5, 255), (300, 300)] {
            assert!(matches!(
                s.disturb(&mut (), r, c, 1.0),
                Err(WaveError::DisturbOutOfRange { .. })
            ));
        }
        assert!(s.disturb(&mut (), 1, 254, 1.0).is_ok());
    }

    #[test]
    fn edges_are_never_written() {
        let mut s = WaveSimulation::cpu(WaveParams {
            rows: 32,
            cols: 32,
            ..WaveParams::default()
        })
        .unwrap()
        .with_ripples(DisturbanceConfig {
            seed: Some(3),
            ..DisturbanceConfig::default()
        })
        .unwrap();

        for _ in 0..400 {
            s.update(&mut (), 0.03);
        }
        assert!(s.steps() >= 399);

        let map = s.displacement_map();
        assert!(map.iter().any(|&h| h != 0.0));
        for k in 0..32 {
            assert_eq!(cell(map, 32, 0, k), 0.0);
            assert_eq!(cell(map, 32, 31, k), 0.0);
            assert_eq!(cell(map, 32, k, 0), 0.0);
            assert_eq!(cell(map, 32, k, 31), 0.0);
        }
        for b in 0..3 {
            let buf = s.kernel().buffer(b);
            assert_eq!(buf[0], 0.0);
            assert_eq!(buf[32 * 32 - 1], 0.0);
        }
    }

    #[test]
    fn ripples_fire_on_their_own_interval() {
        let mut s = sim()
            .with_ripples(DisturbanceConfig {
                seed: Some(9),
                ..DisturbanceConfig::default()
            })
            .unwrap();
        s.update(&mut (), 0.2);
        assert!(s.displacement_map().iter().all(|&h| h == 0.0));
        s.update(&mut (), 0.06);
        assert!(s.displacement_map().iter().any(|&h| h != 0.0));
    }

    #[test]
    fn damped_surface_settles() {
        let mut s = sim();
        s.disturb(&mut (), 128, 128, 1.0).unwrap();
        let energy = |s: &WaveSimulation<CpuWaveKernel>| -> f32 {
            s.displacement_map().iter().map(|h| h * h).sum()
        };
        let start = energy(&s);
        for _ in 0..2000 {
            s.step(&mut ());
        }
        assert!(energy(&s) < start);
    }

    // ── reset ─────────────────────────────────────────────────────────────

    #[test]
    fn reset_clears_everything() {
        let mut s = sim();
        s.disturb(&mut (), 10, 10, 1.0).unwrap();
        s.update(&mut (), 0.1);
        s.reset(&mut ());
        assert_eq!(s.steps(), 0);
        assert_eq!(s.roles(), WaveRoles::default());
        assert!(s.displacement_map().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn construction_rejects_bad_grid() {
        let err = WaveSimulation::cpu(WaveParams {
            rows: 100,
            ..WaveParams::default()
        });
        assert!(matches!(err, Err(WaveError::GridNotTileable { .. })));
    }
}
