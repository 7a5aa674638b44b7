use super::backend::{GpuBackend, GpuResources};
use super::error::{ConstructionError, RenderError};
use super::shader::ShaderProgram;
use super::vertex::VertexLayout;

/// Fixed-capacity interleaved vertex storage, mirrored to the GPU on demand.
///
/// The buffer never grows and never flushes on its own; callers check
/// [`reserve`](Self::reserve) before writing.
pub struct VertexBuffer<R: GpuResources> {
    layout: VertexLayout,
    capacity: usize,
    vertices: Vec<f32>,
    len: usize,
    handle: Option<R::Buffer>,
}

impl<R: GpuResources> VertexBuffer<R> {
    /// Allocates CPU and GPU storage for `capacity` vertices.
    ///
    /// `max_capacity` is validated first; nothing is allocated on failure.
    pub fn new(
        gpu: &mut impl GpuBackend<Resources = R>,
        label: &str,
        layout: VertexLayout,
        capacity: usize,
        max_capacity: usize,
    ) -> Result<Self, ConstructionError> {
        if capacity > max_capacity {
            return Err(ConstructionError::CapacityExceeded {
                requested: capacity,
                max: max_capacity,
            });
        }

        let handle = gpu.create_vertex_buffer(label, &layout, capacity);
        let vertices = vec![0.0; capacity * layout.floats_per_vertex()];

        Ok(Self {
            layout,
            capacity,
            vertices,
            len: 0,
            handle: Some(handle),
        })
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of vertices written since the last [`clear`](Self::clear).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    /// Returns whether `n` more vertices fit.
    #[inline]
    pub fn reserve(&self, n: usize) -> bool {
        n <= self.remaining()
    }

    /// Appends one vertex.
    ///
    /// # Panics
    /// If the buffer is full or `attributes` does not match the layout.
    pub fn write_vertex(&mut self, attributes: &[f32]) {
        let n = self.layout.floats_per_vertex();
        assert_eq!(attributes.len(), n, "vertex has {} floats, layout expects {n}", attributes.len());
        assert!(
            self.len < self.capacity,
            "vertex buffer overflow: capacity is {} vertices",
            self.capacity
        );

        let start = self.len * n;
        self.vertices[start..start + n].copy_from_slice(attributes);
        self.len += 1;
    }

    /// The written prefix, interleaved.
    #[inline]
    pub fn vertices(&self) -> &[f32] {
        &self.vertices[..self.len * self.layout.floats_per_vertex()]
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Copies the first `count` written vertices to the GPU.
    pub fn upload(
        &mut self,
        gpu: &mut impl GpuBackend<Resources = R>,
        count: usize,
    ) -> Result<(), RenderError> {
        debug_assert!(count <= self.len, "upload of {count} vertices exceeds {} written", self.len);
        let floats = count.min(self.len) * self.layout.floats_per_vertex();
        let handle = self
            .handle
            .as_mut()
            .ok_or(RenderError::IllegalState("vertex buffer disposed"))?;
        gpu.upload_vertices(handle, &self.vertices[..floats]);
        Ok(())
    }

    /// Issues one unindexed triangle-list draw over the first `count` vertices.
    pub fn draw_triangles(
        &self,
        gpu: &mut impl GpuBackend<Resources = R>,
        program: &mut ShaderProgram<R>,
        count: usize,
    ) -> Result<(), RenderError> {
        debug_assert!(count % 3 == 0, "triangle list needs a multiple of 3 vertices, got {count}");
        let handle = self
            .handle
            .as_ref()
            .ok_or(RenderError::IllegalState("vertex buffer disposed"))?;
        gpu.draw_triangles(program.handle_mut()?, handle, count as u32)
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }

    /// Releases the GPU buffer. Subsequent calls do nothing.
    pub fn dispose(&mut self, gpu: &mut impl GpuBackend<Resources = R>) {
        if let Some(handle) = self.handle.take() {
            gpu.destroy_vertex_buffer(handle);
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::recording::{GpuCall, RecordingBackend};

    fn buffer(gpu: &mut RecordingBackend, capacity: usize) -> VertexBuffer<RecordingBackend> {
        VertexBuffer::new(gpu, "test", VertexLayout::position_texcoord(), capacity, 10920).unwrap()
    }

    #[test]
    fn over_capacity_fails_before_gpu_allocation() {
        let mut gpu = RecordingBackend::default();
        let res = VertexBuffer::new(&mut gpu, "t", VertexLayout::position(), 20, 10);
        assert_eq!(
            res.err(),
            Some(ConstructionError::CapacityExceeded { requested: 20, max: 10 })
        );
        assert!(gpu.calls.is_empty());
    }

    #[test]
    fn allocates_capacity_times_stride() {
        let mut gpu = RecordingBackend::default();
        let _b = buffer(&mut gpu, 12);
        assert_eq!(gpu.calls, vec![GpuCall::CreateBuffer { buffer: 1, bytes: 12 * 16 }]);
    }

    #[test]
    fn writes_are_interleaved_and_reserve_tracks_room() {
        let mut gpu = RecordingBackend::default();
        let mut b = buffer(&mut gpu, 3);
        b.write_vertex(&[1.0, 2.0, 0.5, 0.5]);
        b.write_vertex(&[3.0, 4.0, 1.0, 0.0]);

        assert_eq!(b.len(), 2);
        assert!(b.reserve(1));
        assert!(!b.reserve(2));
        assert_eq!(b.vertices(), &[1.0, 2.0, 0.5, 0.5, 3.0, 4.0, 1.0, 0.0]);
    }

    #[test]
    fn upload_sends_only_the_requested_prefix() {
        let mut gpu = RecordingBackend::default();
        let mut b = buffer(&mut gpu, 64);
        for i in 0..6 {
            b.write_vertex(&[i as f32, 0.0, 0.0, 0.0]);
        }
        b.upload(&mut gpu, 6).unwrap();
        assert_eq!(gpu.calls.last(), Some(&GpuCall::Upload { buffer: 1, floats: 24 }));
    }

    #[test]
    #[should_panic(expected = "vertex buffer overflow")]
    fn writing_past_capacity_panics() {
        let mut gpu = RecordingBackend::default();
        let mut b = buffer(&mut gpu, 1);
        b.write_vertex(&[0.0; 4]);
        b.write_vertex(&[0.0; 4]);
    }

    #[test]
    #[should_panic(expected = "layout expects 4")]
    fn wrong_attribute_count_panics() {
        let mut gpu = RecordingBackend::default();
        let mut b = buffer(&mut gpu, 4);
        b.write_vertex(&[0.0, 0.0]);
    }

    #[test]
    fn dispose_releases_once() {
        let mut gpu = RecordingBackend::default();
        let mut b = buffer(&mut gpu, 6);
        b.dispose(&mut gpu);
        b.dispose(&mut gpu);
        assert_eq!(gpu.count(|c| matches!(c, GpuCall::DestroyBuffer { .. })), 1);
        assert!(b.upload(&mut gpu, 0).unwrap_err().is_illegal_state());
    }
}
