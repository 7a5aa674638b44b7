use crate::coords::Rect;
use crate::render::backend::{GpuBackend, GpuResources};
use crate::render::buffer::VertexBuffer;
use crate::render::effect::Effect;
use crate::render::error::{ConstructionError, RenderError};
use crate::render::shader::ShaderProgram;

use super::state::{BatchOp, BatchState};
use super::{
    effect_blend, BatchConfig, BatchStats, MAX_VERTICES, PROJECTION_UNIFORM, QUAD_CORNERS,
    RESOLUTION_UNIFORM, TIME_UNIFORM, VERTICES_PER_QUAD,
};

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Accumulates quads for one effect and submits them in as few draw calls as fit.
///
/// Owns its vertex buffer and shader program exclusively; both are created in
/// [`new`](Self::new) and released together in [`dispose`](Self::dispose).
/// The projection and per-frame time are copied in from the caller.
///
/// Overflow policy: a `draw` that would exceed capacity first flushes the
/// pending vertices (one extra draw call), then continues. Draw order and
/// blend state are preserved across the split.
pub struct BatchRenderer<R: GpuResources> {
    effect: Effect,
    vertices: VertexBuffer<R>,
    shader: ShaderProgram<R>,
    state: BatchState,
    projection: [f32; 16],
    resolution: Option<[f32; 3]>,
    stats: BatchStats,
}

impl<R: GpuResources> BatchRenderer<R> {
    /// Compiles the effect and allocates a buffer of `config.capacity` vertices.
    ///
    /// Capacity is validated before anything touches the GPU. Shader compile or
    /// link failures abort construction.
    pub fn new(
        gpu: &mut impl GpuBackend<Resources = R>,
        effect: Effect,
        config: BatchConfig,
    ) -> Result<Self, RenderError> {
        let capacity = config.capacity;
        if capacity > MAX_VERTICES {
            return Err(ConstructionError::CapacityExceeded {
                requested: capacity,
                max: MAX_VERTICES,
            }
            .into());
        }
        if capacity < VERTICES_PER_QUAD {
            return Err(ConstructionError::CapacityTooSmall {
                requested: capacity,
                min: VERTICES_PER_QUAD,
            }
            .into());
        }

        let layout = effect.vertex_layout();
        let mut shader = ShaderProgram::compile(
            gpu,
            &effect.name,
            &effect.vertex_source,
            &effect.fragment_source,
            &layout,
        )?;

        let vertices = match VertexBuffer::new(gpu, &effect.name, layout, capacity, MAX_VERTICES) {
            Ok(v) => v,
            Err(e) => {
                shader.dispose(gpu);
                return Err(e.into());
            }
        };

        log::debug!(
            "batch renderer `{}` created ({capacity} vertices, {} floats/vertex)",
            effect.name,
            vertices.layout().floats_per_vertex()
        );

        Ok(Self {
            effect,
            vertices,
            shader,
            state: BatchState::Idle,
            projection: IDENTITY,
            resolution: None,
            stats: BatchStats::default(),
        })
    }

    #[inline]
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    #[inline]
    pub fn state(&self) -> BatchState {
        self.state
    }

    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.state == BatchState::Drawing
    }

    /// Vertices queued since the last flush.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.vertices.capacity()
    }

    #[inline]
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    #[inline]
    pub fn projection(&self) -> &[f32; 16] {
        &self.projection
    }

    /// Column-major projection × view matrix, read at the next `begin`.
    #[inline]
    pub fn set_projection(&mut self, projection: [f32; 16]) {
        self.projection = projection;
    }

    /// Drawable size in pixels, uploaded as `u_resolution = (w, h, 1)` at `begin`.
    #[inline]
    pub fn set_resolution(&mut self, width: f32, height: f32) {
        self.resolution = Some([width, height, 1.0]);
    }

    /// Queued vertices, interleaved.
    #[inline]
    pub fn queued_vertices(&self) -> &[f32] {
        self.vertices.vertices()
    }

    /// Starts a span: binds the shader, writes projection/time uniforms and
    /// enables blending.
    pub fn begin(
        &mut self,
        gpu: &mut impl GpuBackend<Resources = R>,
        time: f32,
    ) -> Result<(), RenderError> {
        let next = self.state.transition(BatchOp::Begin)?;

        self.vertices.clear();
        self.stats = BatchStats::default();

        self.shader.bind(gpu)?;
        self.shader.set_uniform_mat4(gpu, PROJECTION_UNIFORM, self.projection)?;
        self.shader.set_uniform_f32(gpu, TIME_UNIFORM, time)?;
        if let Some(resolution) = self.resolution {
            self.shader.set_uniform_vec3(gpu, RESOLUTION_UNIFORM, resolution)?;
        }
        gpu.set_blend(Some(effect_blend()));

        self.state = next;
        Ok(())
    }

    /// Queues one axis-aligned quad.
    ///
    /// Vertex order is `(x,y) (x+w,y) (x+w,y+h) (x+w,y+h) (x,y+h) (x,y)`; each
    /// vertex takes the effect's UV for its corner, independent of `rect`.
    pub fn draw(
        &mut self,
        gpu: &mut impl GpuBackend<Resources = R>,
        rect: Rect,
    ) -> Result<(), RenderError> {
        self.state.transition(BatchOp::Draw)?;

        if !self.vertices.reserve(VERTICES_PER_QUAD) {
            log::trace!(
                "batch `{}` full at {} vertices; flushing",
                self.effect.name,
                self.vertices.len()
            );
            self.stats.auto_flushes += 1;
            self.flush(gpu)?;
        }

        let corners = rect.corners();

        for corner in QUAD_CORNERS {
            let [x, y] = corners[corner].to_array();
            match &self.effect.uv_corners {
                Some(uv) => {
                    let [u, v] = uv[corner];
                    self.vertices.write_vertex(&[x, y, u, v]);
                }
                None => self.vertices.write_vertex(&[x, y]),
            }
        }

        self.stats.quads += 1;
        Ok(())
    }

    /// Ends the span: flushes, then disables blending.
    pub fn end(&mut self, gpu: &mut impl GpuBackend<Resources = R>) -> Result<(), RenderError> {
        let next = self.state.transition(BatchOp::End)?;

        let flushed = self.flush(gpu);
        gpu.set_blend(None);
        self.state = next;
        flushed?;

        log::trace!(
            "batch `{}` ended: {} quads, {} draw calls, {} auto-flushes",
            self.effect.name,
            self.stats.quads,
            self.stats.draw_calls,
            self.stats.auto_flushes
        );
        Ok(())
    }

    /// Uploads and draws the queued vertices, then resets the cursor.
    ///
    /// A no-op when nothing is queued. Does not end the span.
    pub fn flush(&mut self, gpu: &mut impl GpuBackend<Resources = R>) -> Result<(), RenderError> {
        self.state.transition(BatchOp::Flush)?;

        let count = self.vertices.len();
        if count == 0 {
            return Ok(());
        }

        let drawn = match self.vertices.upload(gpu, count) {
            Ok(()) => self.vertices.draw_triangles(gpu, &mut self.shader, count),
            Err(e) => Err(e),
        };
        // The cursor resets even when the draw failed.
        self.vertices.clear();
        drawn?;

        self.stats.draw_calls += 1;
        self.stats.vertices_submitted += count;
        log::trace!("batch `{}` flushed {count} vertices", self.effect.name);
        Ok(())
    }

    /// Releases the vertex buffer and shader program. Repeated calls do nothing.
    pub fn dispose(&mut self, gpu: &mut impl GpuBackend<Resources = R>) -> Result<(), RenderError> {
        let next = self.state.transition(BatchOp::Dispose)?;
        if self.state == BatchState::Disposed {
            return Ok(());
        }

        self.vertices.dispose(gpu);
        self.shader.dispose(gpu);
        self.state = next;

        log::debug!("batch renderer `{}` disposed", self.effect.name);
        Ok(())
    }
}
