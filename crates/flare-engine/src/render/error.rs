use std::fmt;

use thiserror::Error;

/// Shader pipeline stage a diagnostic belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Cross-stage checks performed after both stages compiled.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Link => "link",
        };
        f.write_str(s)
    }
}

/// A shader stage failed to compile, or the pair failed to link.
#[derive(Debug, Clone, Error)]
#[error("{stage} shader error in `{label}`:\n{diagnostic}")]
pub struct ShaderCompileError {
    pub label: String,
    pub stage: ShaderStage,
    pub diagnostic: String,
}

impl ShaderCompileError {
    pub(crate) fn new(label: &str, stage: ShaderStage, diagnostic: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            stage,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Invalid renderer or buffer configuration, detected before GPU allocation.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConstructionError {
    #[error("can't have more than {max} vertices per batch: {requested}")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("batch capacity {requested} is below the minimum of {min} vertices (one quad)")]
    CapacityTooSmall { requested: usize, min: usize },

    #[error("vertex attribute location {0} is declared twice")]
    DuplicateLocation(u32),

    #[error("vertex attribute `{0}` is declared twice")]
    DuplicateName(&'static str),
}

/// Errors produced by the render module.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    ShaderCompile(#[from] ShaderCompileError),

    /// A state-machine precondition was violated (programmer error).
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    #[error("uniform `{name}` is declared as {expected} but was set as {found}")]
    UniformType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("draw requested without an attached render target")]
    NoRenderTarget,
}

impl RenderError {
    #[inline]
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, RenderError::IllegalState(_))
    }
}
