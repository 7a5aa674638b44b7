//! GPU rendering subsystem.
//!
//! Effects are drawn through [`BatchRenderer`]: quads are accumulated on the
//! CPU and submitted in one draw call per flush. The renderer talks to the GPU
//! only through [`GpuBackend`]; [`WgpuBackend`] is the production backend.
//!
//! Quad positions are in world units; the vertex shader maps them with the
//! projection set on the renderer, so no coordinate convention is imposed here.

mod buffer;
mod ctx;
mod effect;
mod error;

pub mod backend;
pub mod batch;
pub mod shader;
pub mod vertex;

pub use backend::{GpuBackend, GpuResources, Wgpu, WgpuBackend};
pub use batch::{BatchConfig, BatchRenderer, BatchState, BatchStats};
pub use buffer::VertexBuffer;
pub use ctx::{RenderCtx, RenderTarget};
pub use effect::{Effect, UvCorners};
pub use error::{ConstructionError, RenderError, ShaderCompileError, ShaderStage};
pub use shader::ShaderProgram;
