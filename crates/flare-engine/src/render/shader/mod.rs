//! Shader programs: WGSL compile/link, uniform reflection, typed uniform sets.

mod link;
mod program;
mod uniform;

pub use link::{link, LinkedShader, FRAGMENT_ENTRY, UNIFORM_BINDING, VERTEX_ENTRY};
pub use program::ShaderProgram;
pub use uniform::{UniformBlock, UniformKind, UniformLocation, UniformMember, UniformValue};
