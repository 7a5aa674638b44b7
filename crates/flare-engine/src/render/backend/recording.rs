//! In-memory backend that records every GPU call, for tests.

use crate::render::error::RenderError;
use crate::render::shader::{LinkedShader, UniformLocation};
use crate::render::vertex::VertexLayout;

use super::{GpuBackend, GpuResources};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawRecord {
    pub program: usize,
    pub buffer: usize,
    pub vertex_count: u32,
    /// Interleaved vertices visible to the draw (the uploaded prefix).
    pub vertices: Vec<f32>,
    pub floats_per_vertex: usize,
    /// Uniform block contents at draw time.
    pub uniforms: Vec<u8>,
    pub blend: Option<wgpu::BlendState>,
}

impl DrawRecord {
    pub fn vertex(&self, index: usize) -> &[f32] {
        let n = self.floats_per_vertex;
        &self.vertices[index * n..(index + 1) * n]
    }

    pub fn uniform_f32(&self, offset: u32) -> f32 {
        read_f32(&self.uniforms, offset)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GpuCall {
    CreateBuffer { buffer: usize, bytes: u64 },
    Upload { buffer: usize, floats: usize },
    DestroyBuffer { buffer: usize },
    CreateProgram { program: usize, label: String },
    BindProgram { program: usize },
    WriteUniform { program: usize, offset: u32, bytes: Vec<u8> },
    SetBlend(Option<wgpu::BlendState>),
    Draw(DrawRecord),
    DestroyProgram { program: usize },
}

#[derive(Debug)]
pub(crate) struct RecordedBuffer {
    pub id: usize,
    floats_per_vertex: usize,
    contents: Vec<f32>,
}

#[derive(Debug)]
pub(crate) struct RecordedProgram {
    pub id: usize,
    uniforms: Vec<u8>,
}

impl RecordedProgram {
    pub fn uniform_f32(&self, offset: u32) -> f32 {
        read_f32(&self.uniforms, offset)
    }
}

fn read_f32(bytes: &[u8], offset: u32) -> f32 {
    let o = offset as usize;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[o..o + 4]);
    f32::from_ne_bytes(raw)
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub calls: Vec<GpuCall>,
    next_id: usize,
    blend: Option<wgpu::BlendState>,
}

impl RecordingBackend {
    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    pub fn draws(&self) -> Vec<&DrawRecord> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::Draw(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn blend(&self) -> Option<wgpu::BlendState> {
        self.blend
    }
}

impl GpuResources for RecordingBackend {
    type Buffer = RecordedBuffer;
    type Program = RecordedProgram;
}

impl GpuBackend for RecordingBackend {
    type Resources = Self;

    fn create_vertex_buffer(&mut self, _label: &str, layout: &VertexLayout, capacity: usize) -> RecordedBuffer {
        let id = self.next_id();
        self.calls.push(GpuCall::CreateBuffer {
            buffer: id,
            bytes: layout.stride_bytes() * capacity as u64,
        });
        RecordedBuffer {
            id,
            floats_per_vertex: layout.floats_per_vertex(),
            contents: Vec::new(),
        }
    }

    fn upload_vertices(&mut self, buffer: &mut RecordedBuffer, vertices: &[f32]) {
        buffer.contents = vertices.to_vec();
        self.calls.push(GpuCall::Upload {
            buffer: buffer.id,
            floats: vertices.len(),
        });
    }

    fn destroy_vertex_buffer(&mut self, buffer: RecordedBuffer) {
        self.calls.push(GpuCall::DestroyBuffer { buffer: buffer.id });
    }

    fn create_program(&mut self, shader: &LinkedShader<'_>) -> Result<RecordedProgram, RenderError> {
        let id = self.next_id();
        self.calls.push(GpuCall::CreateProgram {
            program: id,
            label: shader.label.to_string(),
        });
        Ok(RecordedProgram {
            id,
            uniforms: vec![0; shader.uniforms.size() as usize],
        })
    }

    fn bind_program(&mut self, program: &RecordedProgram) {
        self.calls.push(GpuCall::BindProgram { program: program.id });
    }

    fn write_uniform(&mut self, program: &mut RecordedProgram, location: UniformLocation, bytes: &[u8]) {
        let o = location.offset as usize;
        program.uniforms[o..o + bytes.len()].copy_from_slice(bytes);
        self.calls.push(GpuCall::WriteUniform {
            program: program.id,
            offset: location.offset,
            bytes: bytes.to_vec(),
        });
    }

    fn destroy_program(&mut self, program: RecordedProgram) {
        self.calls.push(GpuCall::DestroyProgram { program: program.id });
    }

    fn set_blend(&mut self, blend: Option<wgpu::BlendState>) {
        self.blend = blend;
        self.calls.push(GpuCall::SetBlend(blend));
    }

    fn draw_triangles(
        &mut self,
        program: &mut RecordedProgram,
        buffer: &RecordedBuffer,
        vertex_count: u32,
    ) -> Result<(), RenderError> {
        let floats = vertex_count as usize * buffer.floats_per_vertex;
        assert!(floats <= buffer.contents.len(), "draw reads past the uploaded range");
        self.calls.push(GpuCall::Draw(DrawRecord {
            program: program.id,
            buffer: buffer.id,
            vertex_count,
            vertices: buffer.contents[..floats].to_vec(),
            floats_per_vertex: buffer.floats_per_vertex,
            uniforms: program.uniforms.clone(),
            blend: self.blend,
        }));
        Ok(())
    }
}
