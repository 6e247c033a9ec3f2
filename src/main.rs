use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod color;
mod math;
mod output;
mod renderer;
mod scene;
mod ui;

use output::OutputFormat;
use renderer::{Camera, GpuState, RenderSettings};
use scene::{SCENE_NAMES, SceneDef, scene_by_name};
use ui::{PlaybackStatus, UiActions, apply_theme, draw_playback_panel};

#[derive(Clone, Copy, ValueEnum)]
enum QualityArg {
    /// 854x480 at 15 fps
    Low,
    /// 1280x720 at 30 fps
    Medium,
    /// 1920x1080 at 60 fps
    High,
    /// 3840x2160 at 60 fps
    Ultra,
}

impl QualityArg {
    fn settings(self) -> RenderSettings {
        let (width, height, frame_rate) = match self {
            QualityArg::Low => (854, 480, 15),
            QualityArg::Medium => (1280, 720, 30),
            QualityArg::High => (1920, 1080, 60),
            QualityArg::Ultra => (3840, 2160, 60),
        };
        RenderSettings {
            width,
            height,
            frame_rate,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Frames,
    Mp4,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Frames => OutputFormat::Frames,
            FormatArg::Mp4 => OutputFormat::Mp4,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Renderer for built-in 3D math surface scenes")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Render a scene offline to PNG frames or an mp4 file
    Render {
        /// Scene name, see `list`
        scene: String,

        #[arg(short, long, value_enum, default_value = "medium")]
        quality: QualityArg,

        #[arg(short, long, value_enum, default_value = "frames")]
        format: FormatArg,

        /// Output directory
        #[arg(short, long, default_value = "media")]
        out_dir: PathBuf,
    },

    /// Play a scene in an interactive window
    Preview {
        /// Scene name, see `list`
        scene: String,

        #[arg(short, long, value_enum, default_value = "medium")]
        quality: QualityArg,
    },

    /// List the built-in scenes
    List,
}

fn resolve_scene(name: &str) -> Result<SceneDef> {
    scene_by_name(name).ok_or_else(|| {
        anyhow!(
            "unknown scene '{name}'; available: {}",
            SCENE_NAMES.join(", ")
        )
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        CliCommand::Render {
            scene,
            quality,
            format,
            out_dir,
        } => {
            let scene = resolve_scene(&scene)?;
            renderer::render_scene(&scene, quality.settings(), format.into(), &out_dir)
        }
        CliCommand::Preview { scene, quality } => {
            let scene = resolve_scene(&scene)?;
            run_preview(scene, quality.settings())
        }
        CliCommand::List => {
            for name in SCENE_NAMES {
                if let Some(scene) = scene_by_name(name) {
                    println!("{:<10} {}", scene.name, scene.description);
                }
            }
            Ok(())
        }
    }
}

#[derive(Default)]
struct InputState {
    dragging: bool,
    mouse_delta: Vec2,
}

struct PreviewApp {
    scene: SceneDef,
    settings: RenderSettings,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    camera: Camera,
    base_theta: f32,

    clock: f32,
    paused: bool,
    last_frame: Instant,

    frame_count: u32,
    fps_timer: Instant,
    fps: f32,

    input: InputState,
}

impl PreviewApp {
    fn new(scene: SceneDef, settings: RenderSettings) -> Self {
        let aspect = settings.width as f32 / settings.height as f32;
        let camera = Camera::from_orientation(&scene.camera, aspect);
        let base_theta = camera.theta;

        Self {
            scene,
            settings,
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),
            camera,
            base_theta,
            clock: 0.0,
            paused: false,
            last_frame: Instant::now(),
            frame_count: 0,
            fps_timer: Instant::now(),
            fps: 0.0,
            input: InputState::default(),
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let mut gpu = pollster::block_on(GpuState::new(window.clone()))?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.core.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        let primitives = self.scene.build();
        gpu.core.buffers.upload(&gpu.core.queue, &primitives);

        self.camera
            .set_aspect(gpu.size.width as f32, gpu.size.height as f32);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs_f32() >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer.elapsed().as_secs_f32();
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }

        if !self.paused {
            self.clock = (self.clock + dt).min(self.scene.timeline.duration());
        }

        if self.input.dragging {
            let delta = self.input.mouse_delta;
            self.base_theta -= delta.x * 0.005;
            self.camera.orbit(0.0, -delta.y * 0.005);
        }
        self.input.mouse_delta = Vec2::ZERO;
    }

    fn restart(&mut self) {
        self.clock = 0.0;
        let aspect = self.camera.aspect;
        self.camera = Camera::from_orientation(&self.scene.camera, aspect);
        self.base_theta = self.camera.theta;
        self.paused = false;
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if actions.toggle_pause {
            self.paused = !self.paused;
        }
        if actions.restart {
            self.restart();
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);

        let playback = self.scene.timeline.sample(self.clock);
        self.camera.theta = self.base_theta + playback.theta_offset;

        let status = PlaybackStatus {
            scene_name: self.scene.name,
            description: self.scene.description,
            time: self.clock,
            duration: self.scene.timeline.duration(),
            phi_deg: self.camera.phi.to_degrees(),
            theta_deg: self.camera.theta.to_degrees(),
            fps: self.fps,
            paused: self.paused,
        };

        let mut ui_actions = UiActions::default();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_playback_panel(ctx, &status);
        });

        self.handle_ui_actions(ui_actions);

        let Some(gpu) = &mut self.gpu else { return };
        let Some(window) = &self.window else { return };
        let Some(egui_state) = &mut self.egui_state else {
            return;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                panic!("out of GPU memory");
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.core.update_camera(&self.camera);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.core.device, &gpu.core.queue, id, &delta);
        }

        let mut encoder = gpu
            .core
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Preview Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.core.device,
            &gpu.core.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.core.render(&view, &mut encoder, &playback);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.core.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool, event_loop: &ActiveEventLoop) {
        if !pressed {
            return;
        }
        match key {
            KeyCode::Space => self.paused = !self.paused,
            KeyCode::KeyR => self.restart(),
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }
}

impl ApplicationHandler for PreviewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes()
            .with_title(format!("surfanim preview: {}", self.scene.name))
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));

        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                if let Err(e) = self.init_gpu(Arc::new(window)) {
                    log::error!("GPU init failed: {e:#}");
                    event_loop.exit();
                }
            }
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                    self.camera
                        .set_aspect(size.width as f32, size.height as f32);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.handle_key(key, event.state == ElementState::Pressed, event_loop);
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.input.dragging = state == ElementState::Pressed;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.camera.zoom(scroll);
            }

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.input.dragging {
                self.input.mouse_delta.x += delta.0 as f32;
                self.input.mouse_delta.y += delta.1 as f32;
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run_preview(scene: SceneDef, settings: RenderSettings) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PreviewApp::new(scene, settings);
    if let Err(e) = event_loop.run_app(&mut app) {
        bail!("event loop error: {e}");
    }
    Ok(())
}
