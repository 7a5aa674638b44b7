use std::collections::HashMap;

use crate::render::backend::{GpuBackend, GpuResources};
use crate::render::error::RenderError;
use crate::render::vertex::VertexLayout;

use super::link;
use super::uniform::{UniformBlock, UniformLocation, UniformValue};

/// A linked GPU program with a lazily populated uniform location cache.
pub struct ShaderProgram<R: GpuResources> {
    label: String,
    handle: Option<R::Program>,
    block: UniformBlock,
    // Misses are cached too, so unknown names are looked up once.
    locations: HashMap<String, Option<UniformLocation>>,
}

impl<R: GpuResources> ShaderProgram<R> {
    /// Compiles and links `vertex_source`/`fragment_source` against `layout`.
    ///
    /// Any compile or link failure is returned before GPU resources are created.
    pub fn compile(
        gpu: &mut impl GpuBackend<Resources = R>,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        layout: &VertexLayout,
    ) -> Result<Self, RenderError> {
        let linked = link::link(label, vertex_source, fragment_source, layout)?;
        let handle = gpu.create_program(&linked)?;

        log::debug!(
            "shader program `{label}` linked ({} uniform bytes, {} members)",
            linked.uniforms.size(),
            linked.uniforms.members().len()
        );

        Ok(Self {
            label: label.to_string(),
            handle: Some(handle),
            block: linked.uniforms,
            locations: HashMap::new(),
        })
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn uniforms(&self) -> &UniformBlock {
        &self.block
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }

    pub fn handle(&self) -> Result<&R::Program, RenderError> {
        self.handle
            .as_ref()
            .ok_or(RenderError::IllegalState("shader program disposed"))
    }

    pub fn handle_mut(&mut self) -> Result<&mut R::Program, RenderError> {
        self.handle
            .as_mut()
            .ok_or(RenderError::IllegalState("shader program disposed"))
    }

    /// Makes this program the active one. Binding twice is harmless.
    pub fn bind(&self, gpu: &mut impl GpuBackend<Resources = R>) -> Result<(), RenderError> {
        gpu.bind_program(self.handle()?);
        Ok(())
    }

    /// Resolves `name` through the cache, consulting the reflected block on first use.
    pub fn uniform_location(&mut self, name: &str) -> Option<UniformLocation> {
        if let Some(cached) = self.locations.get(name) {
            return *cached;
        }

        let resolved = self.block.find(name);
        if resolved.is_none() {
            log::debug!("shader `{}`: uniform `{name}` is not active; sets are ignored", self.label);
        }
        self.locations.insert(name.to_string(), resolved);
        resolved
    }

    /// Sets a uniform by name.
    ///
    /// Names the program does not declare are ignored.
    pub fn set_uniform(
        &mut self,
        gpu: &mut impl GpuBackend<Resources = R>,
        name: &str,
        value: UniformValue,
    ) -> Result<(), RenderError> {
        if self.handle.is_none() {
            return Err(RenderError::IllegalState("shader program disposed"));
        }

        let Some(location) = self.uniform_location(name) else {
            return Ok(());
        };

        if location.kind != value.kind() {
            return Err(RenderError::UniformType {
                name: name.to_string(),
                expected: location.kind.name(),
                found: value.kind().name(),
            });
        }

        let handle = self.handle_mut()?;
        gpu.write_uniform(handle, location, value.as_bytes());
        Ok(())
    }

    #[inline]
    pub fn set_uniform_f32(
        &mut self,
        gpu: &mut impl GpuBackend<Resources = R>,
        name: &str,
        value: f32,
    ) -> Result<(), RenderError> {
        self.set_uniform(gpu, name, UniformValue::Float(value))
    }

    #[inline]
    pub fn set_uniform_vec3(
        &mut self,
        gpu: &mut impl GpuBackend<Resources = R>,
        name: &str,
        value: [f32; 3],
    ) -> Result<(), RenderError> {
        self.set_uniform(gpu, name, UniformValue::Vec3(value))
    }

    #[inline]
    pub fn set_uniform_mat4(
        &mut self,
        gpu: &mut impl GpuBackend<Resources = R>,
        name: &str,
        value: [f32; 16],
    ) -> Result<(), RenderError> {
        self.set_uniform(gpu, name, UniformValue::Mat4(value))
    }

    /// Releases the GPU program. Subsequent calls do nothing.
    pub fn dispose(&mut self, gpu: &mut impl GpuBackend<Resources = R>) {
        if let Some(handle) = self.handle.take() {
            gpu.destroy_program(handle);
            self.locations.clear();
            log::debug!("shader program `{}` disposed", self.label);
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_locations(&self) -> usize {
        self.locations.len()
    }
}
