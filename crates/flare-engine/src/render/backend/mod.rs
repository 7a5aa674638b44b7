//! GPU context capability consumed by the batch renderer.
//!
//! The renderer never talks to wgpu directly; everything it needs from the GPU
//! goes through [`GpuBackend`]. Every call is synchronous from the caller's
//! point of view.
//!
//! Handles live in a [`GpuResources`] family so that long-lived renderers
//! don't inherit the borrows of a per-frame backend value.

mod wgpu_impl;

#[cfg(test)]
pub(crate) mod recording;

pub use wgpu_impl::{Wgpu, WgpuBackend, WgpuProgram, WgpuVertexBuffer};

use super::error::RenderError;
use super::shader::{LinkedShader, UniformLocation};
use super::vertex::VertexLayout;

/// Handle types of one GPU API.
pub trait GpuResources: 'static {
    /// GPU-resident vertex storage.
    type Buffer;
    /// Linked GPU program with its uniform storage.
    type Program;
}

pub type BufferOf<R> = <R as GpuResources>::Buffer;
pub type ProgramOf<R> = <R as GpuResources>::Program;

pub trait GpuBackend {
    type Resources: GpuResources;

    /// Allocates storage for `capacity` vertices of `layout`.
    fn create_vertex_buffer(&mut self, label: &str, layout: &VertexLayout, capacity: usize) -> BufferOf<Self::Resources>;

    /// Copies `vertices` (interleaved f32 attributes) to the start of `buffer`.
    fn upload_vertices(&mut self, buffer: &mut BufferOf<Self::Resources>, vertices: &[f32]);

    fn destroy_vertex_buffer(&mut self, buffer: BufferOf<Self::Resources>);

    fn create_program(&mut self, shader: &LinkedShader<'_>) -> Result<ProgramOf<Self::Resources>, RenderError>;

    fn bind_program(&mut self, program: &ProgramOf<Self::Resources>);

    /// Writes `bytes` into the program's uniform block at `location`.
    fn write_uniform(&mut self, program: &mut ProgramOf<Self::Resources>, location: UniformLocation, bytes: &[u8]);

    fn destroy_program(&mut self, program: ProgramOf<Self::Resources>);

    /// `None` disables blending.
    fn set_blend(&mut self, blend: Option<wgpu::BlendState>);

    /// Draws the first `vertex_count` vertices of `buffer` as an unindexed triangle list.
    fn draw_triangles(
        &mut self,
        program: &mut ProgramOf<Self::Resources>,
        buffer: &BufferOf<Self::Resources>,
        vertex_count: u32,
    ) -> Result<(), RenderError>;
}
