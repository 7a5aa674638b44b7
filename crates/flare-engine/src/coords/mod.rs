//! Geometry in world units.
//!
//! Quads are placed in whatever space the caller's projection maps from;
//! the demo uses a 1000x1000 y-down virtual space. `Viewport` is always the
//! drawable in logical pixels.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
