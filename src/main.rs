use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use rotozoom::config::{self, Settings};
use rotozoom::controller::input::native;
use rotozoom::controller::{FrameLoopContext, InputEvent};
use rotozoom::model::SourceImage;
use rotozoom::view::{FrameTexture, GpuContext, RotozoomRenderer};
use rotozoom::{logging, AppError};

struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: RotozoomRenderer,
}

struct App {
    settings: Settings,
    frame_loop: FrameLoopContext,
    graphics: Option<Graphics>,
    // Startup failure raised inside the event loop, reported once it returns
    error: Option<AppError>,
}

impl App {
    fn new(settings: Settings, image: SourceImage) -> Self {
        let frame_loop = FrameLoopContext::new(&settings, image, Instant::now());
        Self {
            settings,
            frame_loop,
            graphics: None,
            error: None,
        }
    }

    fn init_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics, AppError> {
        let window_attributes = Window::default_attributes()
            .with_title(self.frame_loop.state.title())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.settings.window_width,
                self.settings.window_height,
            ))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let size = window.inner_size();
        let gpu = pollster::block_on(GpuContext::new(&instance, surface, size.width, size.height))?;
        let renderer = RotozoomRenderer::new(&gpu.device, gpu.format);

        Ok(Graphics { window, gpu, renderer })
    }

    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gfx) = self.graphics.as_mut() else {
            return;
        };
        let Some(out) = self.frame_loop.update(Instant::now()) else {
            event_loop.exit();
            return;
        };

        gfx.window.set_title(&out.title);

        let texture = FrameTexture::upload(&gfx.gpu, &gfx.renderer, out.frame);
        match gfx.renderer.draw(&gfx.gpu, &texture, out.params) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gfx.gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => warn!(error = ?e, "skipping frame"),
        }
        drop(texture);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match self.init_graphics(event_loop) {
            Ok(graphics) => self.graphics = Some(graphics),
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.frame_loop
                    .input
                    .process_event(&InputEvent::CloseRequested, Instant::now());
                info!("quit requested");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(input) = native::keyboard_event_to_input(&event) {
                    self.frame_loop.input.process_event(&input, Instant::now());
                }
            }
            WindowEvent::Focused(false) => {
                self.frame_loop.input.process_event(&InputEvent::FocusLost, Instant::now());
            }
            WindowEvent::Resized(size) => {
                if let Some(gfx) = self.graphics.as_mut() {
                    gfx.gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gfx) = self.graphics.as_ref() else {
            return;
        };
        let now = Instant::now();
        if self.frame_loop.clock.is_due(now) {
            self.frame_loop.clock.tick(now);
            gfx.window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.frame_loop.clock.deadline()));
    }
}

fn run(settings: Settings) -> Result<(), AppError> {
    info!(
        image = %settings.image_path.display(),
        initial_speed = settings.initial_speed,
        "starting rotozoom"
    );
    let image = SourceImage::load(&settings.image_path)?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, image);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    let settings = config::parse();
    logging::init();

    match run(settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal startup error");
            ExitCode::FAILURE
        }
    }
}
