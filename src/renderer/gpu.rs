use anyhow::{Context, Result};

use crate::renderer::camera::{Camera, CameraUniform};
use crate::scene::{Playback, ScenePrimitives};

const MAX_SURFACE_VERTICES: usize = 200_000;
const MAX_SURFACE_INDICES: usize = 400_000;
const MAX_LINE_VERTICES: usize = 200_000;

fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn color_layout(shader_location: u32) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 16,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: match shader_location {
            1 => &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            }],
            _ => &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            }],
        },
    }
}

fn line_buffer(device: &wgpu::Device, label: &str, floats_per_vertex: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (MAX_LINE_VERTICES * floats_per_vertex * 4) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub struct SceneBuffers {
    surface_position_buffer: wgpu::Buffer,
    surface_normal_buffer: wgpu::Buffer,
    surface_color_buffer: wgpu::Buffer,
    surface_index_buffer: wgpu::Buffer,
    surface_index_count: u32,

    axes_position_buffer: wgpu::Buffer,
    axes_color_buffer: wgpu::Buffer,
    axes_vertex_count: u32,

    stroke_position_buffer: wgpu::Buffer,
    stroke_color_buffer: wgpu::Buffer,
    stroke_vertex_count: u32,
}

impl SceneBuffers {
    fn new(device: &wgpu::Device) -> Self {
        let surface_position_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Surface Position Buffer"),
            size: (MAX_SURFACE_VERTICES * 3 * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let surface_normal_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Surface Normal Buffer"),
            size: (MAX_SURFACE_VERTICES * 3 * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let surface_color_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Surface Color Buffer"),
            size: (MAX_SURFACE_VERTICES * 4 * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let surface_index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Surface Index Buffer"),
            size: (MAX_SURFACE_INDICES * 4) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            surface_position_buffer,
            surface_normal_buffer,
            surface_color_buffer,
            surface_index_buffer,
            surface_index_count: 0,

            axes_position_buffer: line_buffer(device, "Axes Position Buffer", 3),
            axes_color_buffer: line_buffer(device, "Axes Color Buffer", 4),
            axes_vertex_count: 0,

            stroke_position_buffer: line_buffer(device, "Stroke Position Buffer", 3),
            stroke_color_buffer: line_buffer(device, "Stroke Color Buffer", 4),
            stroke_vertex_count: 0,
        }
    }

    pub fn upload(&mut self, queue: &wgpu::Queue, primitives: &ScenePrimitives) {
        let surface = &primitives.surface;
        let vertex_count = surface.vertex_count().min(MAX_SURFACE_VERTICES);
        let index_count = surface.indices.len().min(MAX_SURFACE_INDICES);

        queue.write_buffer(
            &self.surface_position_buffer,
            0,
            bytemuck::cast_slice(&surface.positions[..vertex_count * 3]),
        );
        queue.write_buffer(
            &self.surface_normal_buffer,
            0,
            bytemuck::cast_slice(&surface.normals[..vertex_count * 3]),
        );
        queue.write_buffer(
            &self.surface_color_buffer,
            0,
            bytemuck::cast_slice(&surface.colors[..vertex_count * 4]),
        );
        queue.write_buffer(
            &self.surface_index_buffer,
            0,
            bytemuck::cast_slice(&surface.indices[..index_count]),
        );
        self.surface_index_count = index_count as u32;

        let axes_count = primitives.axes.vertex_count().min(MAX_LINE_VERTICES);
        queue.write_buffer(
            &self.axes_position_buffer,
            0,
            bytemuck::cast_slice(&primitives.axes.positions[..axes_count * 3]),
        );
        queue.write_buffer(
            &self.axes_color_buffer,
            0,
            bytemuck::cast_slice(&primitives.axes.colors[..axes_count * 4]),
        );
        self.axes_vertex_count = axes_count as u32;

        self.stroke_vertex_count = 0;
        if let Some(stroke) = &primitives.stroke {
            let stroke_count = stroke.vertex_count().min(MAX_LINE_VERTICES);
            queue.write_buffer(
                &self.stroke_position_buffer,
                0,
                bytemuck::cast_slice(&stroke.positions[..stroke_count * 3]),
            );
            queue.write_buffer(
                &self.stroke_color_buffer,
                0,
                bytemuck::cast_slice(&stroke.colors[..stroke_count * 4]),
            );
            self.stroke_vertex_count = stroke_count as u32;
        }
    }
}

/// Device, pipelines and scene buffers shared by the windowed and
/// headless paths.
pub struct RenderCore {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    pipeline_surface: wgpu::RenderPipeline,
    pipeline_lines: wgpu::RenderPipeline,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    pub buffers: SceneBuffers,
    depth_texture: wgpu::TextureView,
}

impl RenderCore {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline_surface = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Surface Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_surface_main"),
                buffers: &[position_layout(), normal_layout(), color_layout(2)],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_surface_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let pipeline_lines = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_line_main"),
                buffers: &[position_layout(), color_layout(1)],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let buffers = SceneBuffers::new(&device);
        let depth_texture = create_depth_texture(&device, width, height);

        Self {
            device,
            queue,
            pipeline_surface,
            pipeline_lines,
            camera_buffer,
            camera_bind_group,
            buffers,
            depth_texture,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth_texture = create_depth_texture(&self.device, width, height);
    }

    pub fn update_camera(&self, camera: &Camera) {
        let uniform = CameraUniform::from_camera(camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Draw the scene at one playback instant. Partial reveal renders a
    /// prefix of whole faces and segments.
    pub fn render(
        &self,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        playback: &Playback,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let axes_count = prefix(self.buffers.axes_vertex_count, playback.axes_reveal, 2);
        if axes_count > 0 {
            render_pass.set_pipeline(&self.pipeline_lines);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.buffers.axes_position_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.buffers.axes_color_buffer.slice(..));
            render_pass.draw(0..axes_count, 0..1);
        }

        let index_count = prefix(self.buffers.surface_index_count, playback.surface_reveal, 6);
        if index_count > 0 {
            render_pass.set_pipeline(&self.pipeline_surface);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.buffers.surface_position_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.buffers.surface_normal_buffer.slice(..));
            render_pass.set_vertex_buffer(2, self.buffers.surface_color_buffer.slice(..));
            render_pass.set_index_buffer(
                self.buffers.surface_index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            render_pass.draw_indexed(0..index_count, 0, 0..1);
        }

        let stroke_count = prefix(
            self.buffers.stroke_vertex_count,
            playback.surface_reveal,
            2,
        );
        if stroke_count > 0 {
            render_pass.set_pipeline(&self.pipeline_lines);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.buffers.stroke_position_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.buffers.stroke_color_buffer.slice(..));
            render_pass.draw(0..stroke_count, 0..1);
        }
    }
}

fn prefix(count: u32, fraction: f32, granularity: u32) -> u32 {
    let n = (count as f32 * fraction.clamp(0.0, 1.0)) as u32;
    n / granularity * granularity
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Windowed swapchain state for the preview mode.
pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub core: RenderCore,
}

impl GpuState {
    pub async fn new(window: std::sync::Arc<winit::window::Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .context("failed to acquire GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let core = RenderCore::new(device, queue, surface_format, size.width, size.height);

        Ok(Self {
            surface,
            config,
            size,
            core,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.core.device, &self.config);
            self.core.resize(new_size.width, new_size.height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::prefix;

    #[test]
    fn prefix_rounds_down_to_whole_faces() {
        // 6 indices per quad
        assert_eq!(prefix(60, 0.5, 6), 30);
        assert_eq!(prefix(60, 0.49, 6), 24);
        assert_eq!(prefix(60, 0.01, 6), 0);
    }

    #[test]
    fn prefix_spans_everything_at_one() {
        assert_eq!(prefix(60, 1.0, 6), 60);
        assert_eq!(prefix(30, 1.0, 2), 30);
    }

    #[test]
    fn prefix_is_empty_at_zero() {
        assert_eq!(prefix(60, 0.0, 6), 0);
    }

    #[test]
    fn prefix_clamps_out_of_range_fractions() {
        assert_eq!(prefix(60, 1.5, 6), 60);
        assert_eq!(prefix(60, -0.2, 6), 0);
    }
}
