//! Ripple engine crate.
//!
//! Frame pacing and GPU plumbing for real-time demo scenes: a fence-guarded
//! ring of per-frame resources, a pausable game clock, a compute-driven wave
//! simulation and an edge-detect post effect, driven by a winit frame loop.

pub mod binding;
pub mod core;
pub mod device;
pub mod frame;
pub mod input;
pub mod logging;
pub mod post;
pub mod sync;
pub mod time;
pub mod wave;
pub mod window;
