//! CPU-side compile and link of a WGSL vertex/fragment pair.
//!
//! Both stages go through naga (the same front-end wgpu uses), so every
//! diagnostic is available before any GPU object exists. Linking checks the
//! pair against the vertex layout and against each other, then reflects the
//! uniform block.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Module, ResourceBinding, ScalarKind, Type, TypeInner, VectorSize};

use crate::render::error::{ShaderCompileError, ShaderStage};
use crate::render::vertex::VertexLayout;

use super::uniform::{UniformBlock, UniformKind, UniformLocation, UniformMember};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// The only resource binding a program may declare.
pub const UNIFORM_BINDING: ResourceBinding = ResourceBinding { group: 0, binding: 0 };

/// A validated shader pair, ready for GPU program creation.
#[derive(Debug)]
pub struct LinkedShader<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub layout: &'a VertexLayout,
    pub uniforms: UniformBlock,
}

pub fn link<'a>(
    label: &'a str,
    vertex_source: &'a str,
    fragment_source: &'a str,
    layout: &'a VertexLayout,
) -> Result<LinkedShader<'a>, ShaderCompileError> {
    let vs = compile_stage(label, ShaderStage::Vertex, vertex_source)?;
    let fs = compile_stage(label, ShaderStage::Fragment, fragment_source)?;

    let link_err = |msg: String| ShaderCompileError::new(label, ShaderStage::Link, msg);

    let vs_entry = vs
        .entry_points
        .iter()
        .find(|ep| ep.name == VERTEX_ENTRY && ep.stage == naga::ShaderStage::Vertex)
        .ok_or_else(|| link_err(format!("vertex stage has no `@vertex fn {VERTEX_ENTRY}`")))?;
    let fs_entry = fs
        .entry_points
        .iter()
        .find(|ep| ep.name == FRAGMENT_ENTRY && ep.stage == naga::ShaderStage::Fragment)
        .ok_or_else(|| link_err(format!("fragment stage has no `@fragment fn {FRAGMENT_ENTRY}`")))?;

    // Vertex inputs against the attribute table.
    let mut inputs = Vec::new();
    for arg in &vs_entry.function.arguments {
        collect_locations(&vs, arg.ty, arg.binding.as_ref(), &mut inputs);
    }
    for (location, ty) in inputs {
        let Some(attr) = layout.attribute_at(location) else {
            return Err(link_err(format!(
                "vertex input @location({location}) has no attribute in the vertex layout"
            )));
        };
        match component_count(&vs.types[ty].inner) {
            Some(n) if n == attr.components => {}
            Some(n) => {
                return Err(link_err(format!(
                    "vertex input @location({location}) has {n} components but attribute `{}` provides {}",
                    attr.name, attr.components
                )));
            }
            None => {
                return Err(link_err(format!(
                    "vertex input @location({location}) must be an f32 scalar or vector"
                )));
            }
        }
    }

    // Fragment inputs must be written by the vertex stage.
    let mut outputs = Vec::new();
    if let Some(result) = &vs_entry.function.result {
        collect_locations(&vs, result.ty, result.binding.as_ref(), &mut outputs);
    }
    let mut varyings = Vec::new();
    for arg in &fs_entry.function.arguments {
        collect_locations(&fs, arg.ty, arg.binding.as_ref(), &mut varyings);
    }
    for (location, _) in varyings {
        if !outputs.iter().any(|(l, _)| *l == location) {
            return Err(link_err(format!(
                "fragment input @location({location}) is not written by the vertex stage"
            )));
        }
    }

    let vs_block = reflect_uniforms(&vs).map_err(&link_err)?;
    let fs_block = reflect_uniforms(&fs).map_err(&link_err)?;
    let uniforms = merge_blocks(vs_block, fs_block).map_err(&link_err)?;

    Ok(LinkedShader {
        label,
        vertex_source,
        fragment_source,
        layout,
        uniforms,
    })
}

fn compile_stage(label: &str, stage: ShaderStage, source: &str) -> Result<Module, ShaderCompileError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderCompileError::new(label, stage, e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| ShaderCompileError::new(label, stage, e.emit_to_string(source)))?;

    Ok(module)
}

/// Flattens `@location` bindings of an entry-point argument or result.
fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, Handle<Type>)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push((*location, ty)),
        Some(_) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn is_f32(scalar: naga::Scalar) -> bool {
    scalar.kind == ScalarKind::Float && scalar.width == 4
}

fn component_count(inner: &TypeInner) -> Option<u32> {
    match *inner {
        TypeInner::Scalar(s) if is_f32(s) => Some(1),
        TypeInner::Vector { size, scalar } if is_f32(scalar) => Some(size as u32),
        _ => None,
    }
}

fn uniform_kind(inner: &TypeInner) -> UniformKind {
    match *inner {
        TypeInner::Scalar(s) if is_f32(s) => UniformKind::Float,
        TypeInner::Vector {
            size: VectorSize::Tri,
            scalar,
        } if is_f32(scalar) => UniformKind::Vec3,
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if is_f32(scalar) => UniformKind::Mat4,
        _ => UniformKind::Unsupported,
    }
}

fn kind_size(kind: UniformKind) -> u32 {
    match kind {
        UniformKind::Float => 4,
        UniformKind::Vec3 => 16,
        UniformKind::Mat4 => 64,
        UniformKind::Unsupported => 0,
    }
}

fn reflect_uniforms(module: &Module) -> Result<Option<UniformBlock>, String> {
    let mut block = None;

    for (_, global) in module.global_variables.iter() {
        let Some(binding) = &global.binding else { continue };

        if *binding != UNIFORM_BINDING || !matches!(global.space, AddressSpace::Uniform) {
            return Err(format!(
                "resource `{}` at @group({}) @binding({}) is not supported; only a uniform block at @group(0) @binding(0) is",
                global.name.as_deref().unwrap_or("<unnamed>"),
                binding.group,
                binding.binding
            ));
        }

        let inner = &module.types[global.ty].inner;
        block = Some(match inner {
            TypeInner::Struct { members, span } => {
                let members = members
                    .iter()
                    .filter_map(|m| {
                        let name = m.name.clone()?;
                        Some(UniformMember {
                            name,
                            location: UniformLocation {
                                offset: m.offset,
                                kind: uniform_kind(&module.types[m.ty].inner),
                            },
                        })
                    })
                    .collect();
                UniformBlock::new(*span, members)
            }
            other => {
                let kind = uniform_kind(other);
                let name = global.name.clone().unwrap_or_default();
                UniformBlock::new(
                    kind_size(kind).max(16),
                    vec![UniformMember {
                        name,
                        location: UniformLocation { offset: 0, kind },
                    }],
                )
            }
        });
    }

    Ok(block)
}

fn merge_blocks(vs: Option<UniformBlock>, fs: Option<UniformBlock>) -> Result<UniformBlock, String> {
    match (vs, fs) {
        (None, None) => Ok(UniformBlock::default()),
        (Some(b), None) | (None, Some(b)) => Ok(b),
        (Some(a), Some(b)) => {
            let mut members = a.members().to_vec();
            for m in b.members() {
                match a.find(&m.name) {
                    Some(loc) if loc == m.location => {}
                    Some(loc) => {
                        return Err(format!(
                            "uniform `{}` is declared at offset {} ({}) in the vertex stage and at offset {} ({}) in the fragment stage",
                            m.name, loc.offset, loc.kind, m.location.offset, m.location.kind
                        ));
                    }
                    None => {
                        // Members at the same offset under different names alias each other.
                        if let Some(other) = a.members().iter().find(|o| o.location.offset == m.location.offset) {
                            return Err(format!(
                                "uniform block members `{}` and `{}` share offset {}",
                                other.name, m.name, m.location.offset
                            ));
                        }
                        members.push(m.clone());
                    }
                }
            }
            Ok(UniformBlock::new(a.size().max(b.size()), members))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
struct Uniforms {
    u_projection: mat4x4<f32>,
    u_time: f32,
};
@group(0) @binding(0) var<uniform> u: Uniforms;

struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.position = u.u_projection * vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}
"#;

    const FS: &str = r#"
struct Uniforms {
    u_projection: mat4x4<f32>,
    u_time: f32,
};
@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, fract(u.u_time), 1.0);
}
"#;

    fn layout() -> VertexLayout {
        VertexLayout::position_texcoord()
    }

    #[test]
    fn links_and_reflects_uniform_offsets() {
        let layout = layout();
        let linked = link("test", VS, FS, &layout).expect("valid pair links");
        assert_eq!(linked.uniforms.size(), 80);
        assert_eq!(
            linked.uniforms.find("u_projection"),
            Some(UniformLocation { offset: 0, kind: UniformKind::Mat4 })
        );
        assert_eq!(
            linked.uniforms.find("u_time"),
            Some(UniformLocation { offset: 64, kind: UniformKind::Float })
        );
        assert_eq!(linked.uniforms.find("u_missing"), None);
    }

    #[test]
    fn syntax_error_reports_stage_and_diagnostic() {
        let layout = layout();
        let err = link("broken", VS, "fn fs_main( {", &layout).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Fragment);
        assert!(!err.diagnostic.is_empty());
        assert_eq!(err.label, "broken");
    }

    #[test]
    fn missing_entry_point_is_a_link_error() {
        let layout = layout();
        let fs = FS.replace("fn fs_main", "fn main_fs");
        let err = link("t", VS, &fs, &layout).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Link);
        assert!(err.diagnostic.contains("fs_main"));
    }

    #[test]
    fn vertex_input_without_attribute_is_a_link_error() {
        let layout = VertexLayout::position();
        let err = link("t", VS, FS, &layout).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Link);
        assert!(err.diagnostic.contains("@location(1)"));
    }

    #[test]
    fn component_mismatch_is_a_link_error() {
        let layout = layout();
        let vs = VS.replace("@location(1) uv: vec2<f32>)", "@location(1) uv: vec3<f32>)")
            .replace("out.uv = uv;", "out.uv = uv.xy;");
        let err = link("t", &vs, FS, &layout).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Link);
        assert!(err.diagnostic.contains("3 components"));
    }

    #[test]
    fn unwritten_varying_is_a_link_error() {
        let layout = layout();
        let fs = FS.replace("@location(0) uv: vec2<f32>", "@location(3) uv: vec2<f32>");
        let err = link("t", VS, &fs, &layout).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Link);
        assert!(err.diagnostic.contains("@location(3)"));
    }

    #[test]
    fn disagreeing_uniform_blocks_fail_to_link() {
        let layout = layout();
        let fs = FS.replace(
            "u_projection: mat4x4<f32>,\n    u_time: f32,",
            "u_time: f32,",
        );
        let err = link("t", VS, &fs, &layout).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Link);
        assert!(err.diagnostic.contains("u_time"));
    }

    #[test]
    fn fragment_only_uniforms_are_merged() {
        let layout = layout();
        let fs = FS.replace("u_time: f32,", "u_time: f32,\n    u_resolution: vec3<f32>,");
        let linked = link("t", VS, &fs, &layout).unwrap();
        assert_eq!(
            linked.uniforms.find("u_resolution"),
            Some(UniformLocation { offset: 80, kind: UniformKind::Vec3 })
        );
        assert_eq!(linked.uniforms.size(), 96);
    }

    #[test]
    fn extra_resource_bindings_are_rejected() {
        let layout = layout();
        let fs = format!("@group(0) @binding(1) var<uniform> extra: vec4<f32>;\n{FS}");
        let err = link("t", VS, &fs, &layout).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Link);
        assert!(err.diagnostic.contains("extra"));
    }

    #[test]
    fn programs_without_uniforms_have_an_empty_block() {
        let vs = r#"
@vertex
fn vs_main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(p, 0.0, 1.0);
}
"#;
        let fs = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let layout = VertexLayout::position();
        let linked = link("t", vs, fs, &layout).unwrap();
        assert!(linked.uniforms.is_empty());
    }
}
