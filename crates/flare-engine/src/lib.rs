//! Flare engine crate.
//!
//! Batched shader-effect quads on wgpu, plus the window, device and timing
//! plumbing a binary needs to put them on screen.

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub mod coords;
pub mod effects;
pub mod logging;
pub mod render;
