use anyhow::Result;
use winit::window::{Window, WindowId};

use super::app::AppControl;
use crate::coords::Viewport;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    pub fn viewport(&self) -> Viewport {
        let logical = self.window.inner_size().to_logical::<f64>(self.window.scale_factor());
        Viewport::new(logical.width as f32, logical.height as f32)
    }

    pub fn scale_factor(&self) -> f32 {
        self.window.scale_factor() as f32
    }
}

/// Everything an [`App`](super::App) needs to draw one frame of one window.
///
/// `'a` is the callback, `'w` the window borrow held by [`Gpu`].
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Acquires the next image, clears it to `clear`, runs `draw`, presents.
    ///
    /// Surface errors are handled here: a skipped frame returns
    /// `Ok(AppControl::Continue)` without calling `draw`. An error from `draw`
    /// drops the frame unpresented and is returned.
    pub fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> Result<AppControl>
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>) -> Result<()>,
    {
        let viewport = self.window.viewport();
        if !viewport.is_valid() {
            return Ok(AppControl::Continue);
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface unavailable: {err}");
                return Ok(control_after(self.gpu.handle_surface_error(err)));
            }
        };

        frame.clear(clear);

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            viewport,
            self.window.scale_factor(),
        );

        // The target borrows the encoder; it must be gone before submit.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target)?;
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);
        Ok(AppControl::Continue)
    }
}

/// Only a fatal surface error ends the app; the rest skip a frame.
fn control_after(action: SurfaceErrorAction) -> AppControl {
    match action {
        SurfaceErrorAction::Fatal => AppControl::Exit,
        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => AppControl::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fatal_surface_errors_exit() {
        assert_eq!(control_after(SurfaceErrorAction::Fatal), AppControl::Exit);
        assert_eq!(control_after(SurfaceErrorAction::Reconfigured), AppControl::Continue);
        assert_eq!(control_after(SurfaceErrorAction::SkipFrame), AppControl::Continue);
    }
}
