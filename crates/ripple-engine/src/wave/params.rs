use serde::{Deserialize, Serialize};

use super::WaveError;

/// Edge length of the square compute tile; grid dimensions must be multiples of it.
pub const WAVE_TILE: u32 = 16;

/// One interior cell plus its fixed border on each side.
pub const MIN_GRID: u32 = 3;

/// Physical description of a wave grid.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    pub rows: u32,
    pub cols: u32,
    /// Spatial step between neighbouring cells.
    pub dx: f32,
    /// Fixed integration step in seconds.
    pub dt: f32,
    pub speed: f32,
    pub damping: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            rows: 256,
            cols: 256,
            dx: 0.25,
            dt: 0.03,
            speed: 2.0,
            damping: 0.2,
        }
    }
}

impl WaveParams {
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// `speed·dt/dx`; the scheme diverges above 1/√2.
    pub fn courant(&self) -> f32 {
        self.speed * self.dt / self.dx
    }

    /// Checks the construction contract and derives the integrator constants.
    pub fn validate(&self) -> Result<WaveConstants, WaveError> {
        let Self { rows, cols, dx, dt, speed, damping } = *self;

        if rows < MIN_GRID || cols < MIN_GRID {
            return Err(WaveError::GridTooSmall { rows, cols });
        }
        if rows % WAVE_TILE != 0 || cols % WAVE_TILE != 0 {
            return Err(WaveError::GridNotTileable { rows, cols, tile: WAVE_TILE });
        }

        for (name, value) in [("dx", dx), ("dt", dt)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(WaveError::InvalidParameter { name, value });
            }
        }
        for (name, value) in [("speed", speed), ("damping", damping)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(WaveError::InvalidParameter { name, value });
            }
        }

        let courant = self.courant();
        let limit = std::f32::consts::FRAC_1_SQRT_2;
        if courant > limit {
            return Err(WaveError::Unstable { courant, limit });
        }

        Ok(WaveConstants::derive(self))
    }
}

/// Coefficients of the finite-difference recurrence.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WaveConstants {
    pub k0: f32,
    pub k1: f32,
    pub k2: f32,
}

impl WaveConstants {
    fn derive(p: &WaveParams) -> Self {
        let d = p.damping * p.dt + 2.0;
        let e = (p.speed * p.speed) * (p.dt * p.dt) / (p.dx * p.dx);
        Self {
            k0: (p.damping * p.dt - 2.0) / d,
            k1: (4.0 - 8.0 * e) / d,
            k2: (2.0 * e) / d,
        }
    }
}
