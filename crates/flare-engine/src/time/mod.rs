//! Frame timing.
//!
//! One `FrameClock` per window. `tick()` once per presented frame; the
//! accumulated `elapsed` is what effects receive as their time uniform.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
