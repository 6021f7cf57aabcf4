//! Time subsystem.
//!
//! Provides a pausable game clock that is independent of the runtime.
//! Intended usage:
//! - one `GameClock` per render loop
//! - call `tick()` once per frame, then read `delta_time()` / `total_time()`

mod game_clock;

pub use game_clock::{GameClock, SystemTime, TimeSource};
