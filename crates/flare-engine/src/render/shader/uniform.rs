use std::fmt;

/// Shape of a uniform block member.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    Float,
    Vec3,
    Mat4,
    /// Declared in the shader with a shape that cannot be set from the CPU side.
    Unsupported,
}

impl UniformKind {
    pub fn name(self) -> &'static str {
        match self {
            UniformKind::Float => "f32",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
            UniformKind::Unsupported => "unsupported type",
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed uniform value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3([f32; 3]),
    /// Column-major.
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    pub fn as_floats(&self) -> &[f32] {
        match self {
            UniformValue::Float(v) => std::slice::from_ref(v),
            UniformValue::Vec3(v) => v,
            UniformValue::Mat4(v) => v,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_floats())
    }
}

/// Resolved location of a uniform: byte offset inside the program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub offset: u32,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformMember {
    pub name: String,
    pub location: UniformLocation,
}

/// Reflected layout of the `@group(0) @binding(0)` uniform block.
///
/// An empty block (`size == 0`) means the program declares no uniforms.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UniformBlock {
    size: u32,
    members: Vec<UniformMember>,
}

impl UniformBlock {
    pub(crate) fn new(size: u32, members: Vec<UniformMember>) -> Self {
        Self { size, members }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn members(&self) -> &[UniformMember] {
        &self.members
    }

    pub fn find(&self, name: &str) -> Option<UniformLocation> {
        self.members.iter().find(|m| m.name == name).map(|m| m.location)
    }
}
