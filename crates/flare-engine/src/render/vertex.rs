//! Vertex attribute binding table.
//!
//! Shaders reference attributes by `@location(n)`; the layout records which
//! location each CPU-side attribute feeds, so the two sides are checked
//! against each other at link time instead of agreeing by naming convention.

use super::error::ConstructionError;

/// One f32 vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub location: u32,
    /// Number of f32 components (1..=4).
    pub components: u32,
}

impl VertexAttribute {
    pub const fn new(name: &'static str, location: u32, components: u32) -> Self {
        Self {
            name,
            location,
            components,
        }
    }

    fn format(self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// 2D position in world units.
pub const POSITION: VertexAttribute = VertexAttribute::new("a_position", 0, 2);

/// Texture coordinate taken from the effect's corner convention.
pub const TEXCOORD: VertexAttribute = VertexAttribute::new("a_texcoord", 1, 2);

/// Ordered, immutable set of interleaved f32 attributes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    wgpu_attributes: Vec<wgpu::VertexAttribute>,
    floats_per_vertex: usize,
}

impl VertexLayout {
    /// Builds a layout from attributes in interleave order.
    pub fn new(attributes: &[VertexAttribute]) -> Result<Self, ConstructionError> {
        for (i, a) in attributes.iter().enumerate() {
            debug_assert!((1..=4).contains(&a.components), "attribute `{}` has {} components", a.name, a.components);
            for b in &attributes[..i] {
                if a.location == b.location {
                    return Err(ConstructionError::DuplicateLocation(a.location));
                }
                if a.name == b.name {
                    return Err(ConstructionError::DuplicateName(a.name));
                }
            }
        }

        let mut offset = 0u64;
        let mut wgpu_attributes = Vec::with_capacity(attributes.len());
        for a in attributes {
            wgpu_attributes.push(wgpu::VertexAttribute {
                format: a.format(),
                offset,
                shader_location: a.location,
            });
            offset += u64::from(a.components) * 4;
        }

        Ok(Self {
            attributes: attributes.to_vec(),
            wgpu_attributes,
            floats_per_vertex: (offset / 4) as usize,
        })
    }

    /// `[POSITION]`.
    pub fn position() -> Self {
        Self::from_builtin(&[POSITION])
    }

    /// `[POSITION, TEXCOORD]`.
    pub fn position_texcoord() -> Self {
        Self::from_builtin(&[POSITION, TEXCOORD])
    }

    fn from_builtin(attributes: &[VertexAttribute]) -> Self {
        match Self::new(attributes) {
            Ok(layout) => layout,
            Err(e) => unreachable!("built-in vertex layout is invalid: {e}"),
        }
    }

    #[inline]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    #[inline]
    pub fn floats_per_vertex(&self) -> usize {
        self.floats_per_vertex
    }

    #[inline]
    pub fn stride_bytes(&self) -> u64 {
        (self.floats_per_vertex * std::mem::size_of::<f32>()) as u64
    }

    pub fn location_of(&self, name: &str) -> Option<u32> {
        self.attributes.iter().find(|a| a.name == name).map(|a| a.location)
    }

    pub fn attribute_at(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }

    pub fn wgpu_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride_bytes(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.wgpu_attributes,
        }
    }
}
