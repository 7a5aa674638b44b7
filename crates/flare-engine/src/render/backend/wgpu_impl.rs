use wgpu::util::DeviceExt;

use crate::render::error::RenderError;
use crate::render::shader::{LinkedShader, UniformLocation, FRAGMENT_ENTRY, UNIFORM_BINDING, VERTEX_ENTRY};
use crate::render::vertex::VertexLayout;
use crate::render::{RenderCtx, RenderTarget};

use super::{GpuBackend, GpuResources};

/// wgpu implementation of [`GpuBackend`].
///
/// Build one per use site: [`WgpuBackend::new`] when only resources are
/// created or released, [`WgpuBackend::with_target`] inside a frame so that
/// flushes can record render passes.
///
/// With a target attached, vertex and uniform uploads are recorded as
/// staging copies on the frame encoder, ordered with the render passes. This
/// keeps several flushes within one frame from overwriting each other's data.
pub struct WgpuBackend<'a, 't> {
    ctx: &'a RenderCtx<'a>,
    target: Option<&'a mut RenderTarget<'t>>,
    blend: Option<wgpu::BlendState>,
}

impl<'a, 't> WgpuBackend<'a, 't> {
    pub fn new(ctx: &'a RenderCtx<'a>) -> Self {
        Self {
            ctx,
            target: None,
            blend: None,
        }
    }

    pub fn with_target(ctx: &'a RenderCtx<'a>, target: &'a mut RenderTarget<'t>) -> Self {
        Self {
            ctx,
            target: Some(target),
            blend: None,
        }
    }

    fn write_buffer(&mut self, dst: &wgpu::Buffer, bytes: &[u8]) {
        write_ordered(self.ctx, self.target.as_deref_mut(), dst, bytes);
    }
}

fn write_ordered(ctx: &RenderCtx<'_>, target: Option<&mut RenderTarget<'_>>, dst: &wgpu::Buffer, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    match target {
        Some(target) => {
            let staging = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("flare staging"),
                contents: bytes,
                usage: wgpu::BufferUsages::COPY_SRC,
            });
            target
                .encoder
                .copy_buffer_to_buffer(&staging, 0, dst, 0, bytes.len() as u64);
        }
        None => ctx.queue.write_buffer(dst, 0, bytes),
    }
}

/// Handle family of [`WgpuBackend`].
#[derive(Debug)]
pub enum Wgpu {}

impl GpuResources for Wgpu {
    type Buffer = WgpuVertexBuffer;
    type Program = WgpuProgram;
}

pub struct WgpuVertexBuffer {
    buffer: wgpu::Buffer,
    stride: u64,
}

struct UniformStorage {
    data: Vec<u8>,
    dirty: bool,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Shader modules plus one pipeline per blend state in use.
pub struct WgpuProgram {
    label: String,
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    layout: VertexLayout,
    pipeline_layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    pipelines: Vec<(Option<wgpu::BlendState>, wgpu::RenderPipeline)>,
    uniforms: Option<UniformStorage>,
}

impl WgpuProgram {
    fn ensure_pipeline(&mut self, device: &wgpu::Device, blend: Option<wgpu::BlendState>) -> usize {
        if let Some(i) = self.pipelines.iter().position(|(b, _)| *b == blend) {
            return i;
        }

        let label = format!("flare {} pipeline", self.label);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[self.layout.wgpu_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.fragment_module,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Quads may be given with negative extents; draw both windings.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::trace!("{label} created (blend: {})", blend.is_some());
        self.pipelines.push((blend, pipeline));
        self.pipelines.len() - 1
    }
}

impl GpuBackend for WgpuBackend<'_, '_> {
    type Resources = Wgpu;

    fn create_vertex_buffer(&mut self, label: &str, layout: &VertexLayout, capacity: usize) -> WgpuVertexBuffer {
        let label = format!("flare {label} vbo");
        let stride = layout.stride_bytes();
        let buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        WgpuVertexBuffer { buffer, stride }
    }

    fn upload_vertices(&mut self, buffer: &mut WgpuVertexBuffer, vertices: &[f32]) {
        self.write_buffer(&buffer.buffer, bytemuck::cast_slice(vertices));
    }

    fn destroy_vertex_buffer(&mut self, buffer: WgpuVertexBuffer) {
        buffer.buffer.destroy();
    }

    fn create_program(&mut self, shader: &LinkedShader<'_>) -> Result<WgpuProgram, RenderError> {
        let device = self.ctx.device;

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("flare {} vs", shader.label)),
            source: wgpu::ShaderSource::Wgsl(shader.vertex_source.into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("flare {} fs", shader.label)),
            source: wgpu::ShaderSource::Wgsl(shader.fragment_source.into()),
        });

        let mut bind_group_layout = None;
        let mut uniforms = None;

        if let Some(size) = std::num::NonZeroU64::new(u64::from(shader.uniforms.size())) {
            let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("flare {} bgl", shader.label)),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: UNIFORM_BINDING.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(size),
                    },
                    count: None,
                }],
            });

            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("flare {} ubo", shader.label)),
                size: size.get(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("flare {} bind group", shader.label)),
                layout: &bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING.binding,
                    resource: buffer.as_entire_binding(),
                }],
            });

            uniforms = Some(UniformStorage {
                data: vec![0; size.get() as usize],
                dirty: true,
                buffer,
                bind_group,
            });
            bind_group_layout = Some(bgl);
        }

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("flare {} pipeline layout", shader.label)),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        Ok(WgpuProgram {
            label: shader.label.to_string(),
            vertex_module,
            fragment_module,
            layout: shader.layout.clone(),
            pipeline_layout,
            format: self.ctx.surface_format,
            pipelines: Vec::new(),
            uniforms,
        })
    }

    fn bind_program(&mut self, program: &WgpuProgram) {
        // Pipelines are selected per render pass; nothing to bind eagerly.
        log::trace!("bind program `{}`", program.label);
    }

    fn write_uniform(&mut self, program: &mut WgpuProgram, location: UniformLocation, bytes: &[u8]) {
        let Some(u) = program.uniforms.as_mut() else { return };
        let start = location.offset as usize;
        let Some(slot) = u.data.get_mut(start..start + bytes.len()) else {
            log::warn!("uniform write at offset {start} overruns block of `{}`", program.label);
            return;
        };
        slot.copy_from_slice(bytes);
        u.dirty = true;
    }

    fn destroy_program(&mut self, program: WgpuProgram) {
        if let Some(u) = &program.uniforms {
            u.buffer.destroy();
        }
        log::trace!("program `{}` released", program.label);
    }

    fn set_blend(&mut self, blend: Option<wgpu::BlendState>) {
        self.blend = blend;
    }

    fn draw_triangles(
        &mut self,
        program: &mut WgpuProgram,
        buffer: &WgpuVertexBuffer,
        vertex_count: u32,
    ) -> Result<(), RenderError> {
        if vertex_count == 0 {
            return Ok(());
        }

        let ctx = self.ctx;
        let blend = self.blend;
        let Some(target) = self.target.as_deref_mut() else {
            return Err(RenderError::NoRenderTarget);
        };

        if let Some(u) = program.uniforms.as_mut() {
            if u.dirty {
                write_ordered(ctx, Some(&mut *target), &u.buffer, &u.data);
                u.dirty = false;
            }
        }

        let index = program.ensure_pipeline(ctx.device, blend);
        let pipeline = &program.pipelines[index].1;
        let bind_group = program.uniforms.as_ref().map(|u| &u.bind_group);
        let byte_len = u64::from(vertex_count) * buffer.stride;

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("flare batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        if let Some(bind_group) = bind_group {
            rpass.set_bind_group(0, bind_group, &[]);
        }
        rpass.set_vertex_buffer(0, buffer.buffer.slice(..byte_len));
        rpass.draw(0..vertex_count, 0..1);

        Ok(())
    }
}
