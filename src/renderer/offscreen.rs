use anyhow::{Context, Result, bail, ensure};

use crate::renderer::gpu::RenderCore;
use crate::scene::Playback;

/// Offscreen render target plus readback for the offline path.
pub struct HeadlessState {
    pub core: RenderCore,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

impl HeadlessState {
    pub async fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(width > 0 && height > 0, "render target must be non-empty");

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter available for headless rendering")?;

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

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Headless Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let core = RenderCore::new(device, queue, TARGET_FORMAT, width, height);

        Ok(Self {
            core,
            target,
            target_view,
            width,
            height,
        })
    }

    /// Render one frame and return tight RGBA8 bytes.
    pub fn render_frame(&self, playback: &Playback) -> Result<Vec<u8>> {
        let mut encoder =
            self.core
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Headless Encoder"),
                });
        self.core.render(&self.target_view, &mut encoder, playback);
        self.core.queue.submit(std::iter::once(encoder.finish()));

        read_texture_tight(
            &self.core.device,
            &self.core.queue,
            &self.target,
            (self.width, self.height),
        )
    }
}

fn align_bytes_per_row(value: usize) -> usize {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    value.div_ceil(align) * align
}

/// Copy an RGBA8 texture to a mappable buffer and depad the rows.
pub fn read_texture_tight(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Texture,
    size: (u32, u32),
) -> Result<Vec<u8>> {
    let (width, height) = size;
    ensure!(width > 0 && height > 0, "readback size must be positive");

    let tight_bpr = 4 * width as usize;
    let padded_bpr = align_bytes_per_row(tight_bpr);
    let buffer_size = (padded_bpr * height as usize) as wgpu::BufferAddress;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging Buffer"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: src,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr as u32),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = crossbeam::channel::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => bail!("buffer mapping failed: {e}"),
        Err(_) => bail!("buffer map callback dropped"),
    }

    let data = slice.get_mapped_range();
    let mut tight = vec![0u8; tight_bpr * height as usize];
    for row in 0..height as usize {
        let src_offset = row * padded_bpr;
        let dst_offset = row * tight_bpr;
        tight[dst_offset..dst_offset + tight_bpr]
            .copy_from_slice(&data[src_offset..src_offset + tight_bpr]);
    }
    drop(data);
    staging.unmap();

    Ok(tight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_target_is_rejected() {
        assert!(pollster::block_on(HeadlessState::new(0, 10)).is_err());
        assert!(pollster::block_on(HeadlessState::new(10, 0)).is_err());
        assert!(pollster::block_on(HeadlessState::new(0, 0)).is_err());
    }

    #[test]
    fn row_alignment_rounds_up_to_256() {
        assert_eq!(align_bytes_per_row(1), 256);
        assert_eq!(align_bytes_per_row(256), 256);
        assert_eq!(align_bytes_per_row(257), 512);
        // 854 px * 4 bytes = 3416 -> 3584
        assert_eq!(align_bytes_per_row(854 * 4), 3584);
    }
}
