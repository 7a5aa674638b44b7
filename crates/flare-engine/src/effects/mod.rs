//! Built-in effects.
//!
//! Every effect shares the uniform block convention of the batch renderer:
//! `u_projection: mat4x4<f32>` and `u_time: f32` at `@group(0) @binding(0)`,
//! with `u_resolution: vec3<f32>` appended by screen-space effects.

use crate::render::{Effect, UvCorners};

const QUAD_VS: &str = include_str!("shaders/quad.vert.wgsl");
const SCREEN_VS: &str = include_str!("shaders/screen.vert.wgsl");

const FIRE_FS: &str = concat!(
    include_str!("shaders/flame.wgsl"),
    include_str!("shaders/fire.frag.wgsl")
);
const FIRE_SCREEN_FS: &str = concat!(
    include_str!("shaders/flame.wgsl"),
    include_str!("shaders/fire_screen.frag.wgsl")
);
const GRADIENT_FLOW_FS: &str = include_str!("shaders/gradient_flow.frag.wgsl");

/// Flame base at the quad's bottom edge under a y-down projection.
pub const FIRE_UV: UvCorners = [[1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0], [1.0, -1.0]];

pub const GRADIENT_FLOW_UV: UvCorners = [[-1.0, 1.0], [1.0, 1.0], [1.0, -1.0], [-1.0, -1.0]];

/// Animated worley-noise flame, mapped per quad.
pub fn fire() -> Effect {
    Effect::new("fire", QUAD_VS, FIRE_FS, Some(FIRE_UV))
}

/// Slowly rotating two-tone blue gradient.
pub fn gradient_flow() -> Effect {
    Effect::new("gradient_flow", QUAD_VS, GRADIENT_FLOW_FS, Some(GRADIENT_FLOW_UV))
}

/// The flame evaluated in framebuffer space; quads act as a mask.
///
/// Needs a resolution, see [`BatchRenderer::set_resolution`](crate::render::BatchRenderer::set_resolution).
pub fn fire_screen() -> Effect {
    Effect::new("fire_screen", SCREEN_VS, FIRE_SCREEN_FS, None)
}

/// All built-in effects, in a stable order.
pub fn builtin() -> [Effect; 3] {
    [fire(), gradient_flow(), fire_screen()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shader::{UniformKind, link};
    use crate::render::vertex::VertexLayout;

    #[test]
    fn every_builtin_links() {
        for effect in builtin() {
            let layout = effect.vertex_layout();
            let linked = link(&effect.name, &effect.vertex_source, &effect.fragment_source, &layout);
            if let Err(e) = linked {
                panic!("{e}");
            }
        }
    }

    #[test]
    fn quad_effects_share_the_projection_and_time_offsets() {
        for effect in [fire(), gradient_flow()] {
            let layout = effect.vertex_layout();
            let linked = link(&effect.name, &effect.vertex_source, &effect.fragment_source, &layout).unwrap();
            let projection = linked.uniforms.find("u_projection").unwrap();
            let time = linked.uniforms.find("u_time").unwrap();
            assert_eq!((projection.offset, projection.kind), (0, UniformKind::Mat4));
            assert_eq!((time.offset, time.kind), (64, UniformKind::Float));
            assert!(linked.uniforms.find("u_resolution").is_none());
        }
    }

    #[test]
    fn screen_fire_is_position_only_and_takes_a_resolution() {
        let effect = fire_screen();
        assert_eq!(effect.vertex_layout(), VertexLayout::position());

        let layout = effect.vertex_layout();
        let linked = link(&effect.name, &effect.vertex_source, &effect.fragment_source, &layout).unwrap();
        let resolution = linked.uniforms.find("u_resolution").unwrap();
        assert_eq!((resolution.offset, resolution.kind), (80, UniformKind::Vec3));
    }

    #[test]
    fn fire_uv_is_rotated_against_the_gradient() {
        assert_eq!(FIRE_UV[0], [1.0, 1.0]);
        assert_eq!(GRADIENT_FLOW_UV[0], [-1.0, 1.0]);
        assert_ne!(FIRE_UV, GRADIENT_FLOW_UV);
    }
}
