use std::borrow::Cow;

use super::vertex::VertexLayout;

/// Texture coordinates for a quad's corners, in drawing order:
/// `(x, y)`, `(x + w, y)`, `(x + w, y + h)`, `(x, y + h)`.
pub type UvCorners = [[f32; 2]; 4];

/// Passive description of a shader effect.
///
/// Holds the WGSL pair and the per-corner UV convention. The renderer is
/// agnostic to what the shaders compute.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub name: Cow<'static, str>,
    pub vertex_source: Cow<'static, str>,
    pub fragment_source: Cow<'static, str>,
    /// `None` for screen-space effects that only need positions.
    pub uv_corners: Option<UvCorners>,
}

impl Effect {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        vertex_source: impl Into<Cow<'static, str>>,
        fragment_source: impl Into<Cow<'static, str>>,
        uv_corners: Option<UvCorners>,
    ) -> Self {
        Self {
            name: name.into(),
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            uv_corners,
        }
    }

    /// Layout implied by the UV convention.
    pub fn vertex_layout(&self) -> VertexLayout {
        if self.uv_corners.is_some() {
            VertexLayout::position_texcoord()
        } else {
            VertexLayout::position()
        }
    }
}
