mod camera;

use anyhow::{Context, Result};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use flare_engine::coords::Rect;
use flare_engine::core::{App, AppControl, FrameCtx};
use flare_engine::device::GpuInit;
use flare_engine::effects;
use flare_engine::logging::{init_logging, LoggingConfig};
use flare_engine::render::{BatchConfig, BatchRenderer, RenderCtx, Wgpu, WgpuBackend};
use flare_engine::window::{Runtime, RuntimeConfig};

use camera::Camera;

const VIRTUAL_SIZE: f32 = 1000.0;

const FIRE_RECT: Rect = Rect::new(10.0, 10.0, 100.0, 100.0);
const GRADIENT_RECT: Rect = Rect::new(10.0, 100.0, 500.0, 500.0);

/// GPU-side state, created on the first frame.
struct Scene {
    fire: BatchRenderer<Wgpu>,
    gradient: BatchRenderer<Wgpu>,
}

impl Scene {
    fn new(gpu: &mut WgpuBackend<'_, '_>) -> Result<Self> {
        let fire = BatchRenderer::new(gpu, effects::fire(), BatchConfig::default())
            .context("failed to build the fire renderer")?;
        let gradient = BatchRenderer::new(gpu, effects::gradient_flow(), BatchConfig::default())
            .context("failed to build the gradient renderer")?;
        Ok(Self { fire, gradient })
    }

    fn draw(&mut self, gpu: &mut WgpuBackend<'_, '_>, projection: [f32; 16], time: f32) -> Result<()> {
        self.fire.set_projection(projection);
        self.fire.begin(gpu, time)?;
        self.fire.draw(gpu, FIRE_RECT)?;
        self.fire.end(gpu)?;

        self.gradient.set_projection(projection);
        self.gradient.begin(gpu, time)?;
        self.gradient.draw(gpu, GRADIENT_RECT)?;
        self.gradient.end(gpu)?;
        Ok(())
    }

    fn dispose(&mut self, rctx: &RenderCtx<'_>) -> Result<()> {
        let mut gpu = WgpuBackend::new(rctx);
        self.fire.dispose(&mut gpu)?;
        self.gradient.dispose(&mut gpu)?;
        Ok(())
    }
}

struct FlareDemo {
    camera: Camera,
    scene: Option<Scene>,
    closing: bool,
}

impl FlareDemo {
    fn new() -> Self {
        Self {
            camera: Camera::new(VIRTUAL_SIZE, VIRTUAL_SIZE),
            scene: None,
            closing: false,
        }
    }

    fn frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        let time = ctx.time.elapsed;
        let closing = self.closing;
        let camera = self.camera;
        let scene = &mut self.scene;

        let control = ctx.render(wgpu::Color::WHITE, |rctx, target| {
            if closing {
                if let Some(mut scene) = scene.take() {
                    scene.dispose(rctx)?;
                }
                return Ok(());
            }

            let projection = camera.combined(rctx.viewport).to_cols_array();
            let mut gpu = WgpuBackend::with_target(rctx, target);
            if scene.is_none() {
                *scene = Some(Scene::new(&mut gpu)?);
            }
            if let Some(scene) = scene.as_mut() {
                scene.draw(&mut gpu, projection, time)?;
            }
            Ok(())
        })?;

        Ok(if closing { AppControl::Exit } else { control })
    }
}

impl App for FlareDemo {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    state: ElementState::Pressed,
                    ..
                },
            ..
        } = event
        {
            // Renderers are released on the next frame, where a device is available.
            self.closing = true;
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        match self.frame(ctx) {
            Ok(control) => control,
            Err(e) => {
                log::error!("frame failed: {e:#}");
                AppControl::Exit
            }
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::from_env("FLARE_LOG"));

    let config = RuntimeConfig {
        title: "flare".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), FlareDemo::new())
}
