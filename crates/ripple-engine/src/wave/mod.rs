//! GPU-resident 2D wave simulation.
//!
//! The surface is a `rows × cols` grid of heights advanced with an explicit
//! finite-difference scheme:
//!
//! ```text
//! next[i,j] = K0·prev[i,j] + K1·curr[i,j] + K2·(curr[i-1,j] + curr[i+1,j] + curr[i,j-1] + curr[i,j+1])
//! ```
//!
//! Three buffers hold prev/curr/next. After each step the roles rotate
//! (prev ← curr, curr ← next, next ← prev) by index; no data is copied.
//! Edge cells are never written by the integrator and keep their initial value.
//!
//! The stepping logic lives in `WaveSimulation`; the per-step work is done by a
//! `WaveKernel`: `GpuWaveKernel` records compute dispatches, `CpuWaveKernel`
//! runs the same arithmetic on the CPU.

mod cpu;
mod error;
mod gpu;
mod kernel;
mod params;
mod ripples;
mod roles;
mod simulation;
mod stepper;

pub use cpu::CpuWaveKernel;
pub use error::WaveError;
pub use gpu::{GpuWaveKernel, WaveDisplacement};
pub use kernel::WaveKernel;
pub use params::{WaveConstants, WaveParams, MIN_GRID, WAVE_TILE};
pub use ripples::{Disturbance, DisturbanceConfig, DisturbanceSchedule};
pub use roles::WaveRoles;
pub use simulation::WaveSimulation;
pub use stepper::{StepAccumulator, MAX_STEPS_PER_UPDATE};
