//! Batched quad renderer for shader effects.
//!
//! One [`BatchRenderer`] per [`Effect`](crate::render::Effect). Per frame:
//! `set_projection`, `begin(time)`, any number of `draw(rect)`, `end()`.
//!
//! Quads are submitted as 6 unindexed vertices (two triangles sharing the
//! 2→0 diagonal). When a `draw` would not fit, the pending batch is flushed
//! and the draw continues into the emptied buffer, so a span may issue more
//! than one draw call but never overruns the buffer.

mod renderer;
mod state;

pub use renderer::BatchRenderer;
pub use state::{BatchOp, BatchState};

pub const VERTICES_PER_QUAD: usize = 6;

/// Indices a 16-bit indexed quad scheme would spend per quad.
const INDICES_PER_QUAD: usize = 6;

/// Largest batch, in vertices: the 16-bit index space split into 6-index
/// quads, rounded down to whole quads (10920).
pub const MAX_VERTICES: usize =
    (u16::MAX as usize / INDICES_PER_QUAD) / VERTICES_PER_QUAD * VERTICES_PER_QUAD;

/// Corner index of each emitted vertex: triangles (0,1,2) and (2,3,0).
pub const QUAD_CORNERS: [usize; VERTICES_PER_QUAD] = [0, 1, 2, 2, 3, 0];

pub const PROJECTION_UNIFORM: &str = "u_projection";
pub const TIME_UNIFORM: &str = "u_time";
pub const RESOLUTION_UNIFORM: &str = "u_resolution";

/// Renderer construction parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BatchConfig {
    /// Vertex capacity; `VERTICES_PER_QUAD..=MAX_VERTICES`.
    pub capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_VERTICES,
        }
    }
}

impl BatchConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }
}

/// Counters for the current (or last finished) `begin..end` span.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BatchStats {
    pub quads: u32,
    pub draw_calls: u32,
    pub vertices_submitted: usize,
    /// Flushes forced by a full buffer.
    pub auto_flushes: u32,
}

/// Colour blends `SrcAlpha / OneMinusSrcAlpha`; alpha blends `One / OneMinusSrcAlpha`.
pub fn effect_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_limit_is_whole_quads_of_the_16_bit_index_space() {
        assert_eq!(MAX_VERTICES, 10920);
        assert_eq!(MAX_VERTICES % VERTICES_PER_QUAD, 0);
    }
}
