//! winit event loop and per-window GPU state.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
