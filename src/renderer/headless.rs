use std::path::Path;

use anyhow::Result;

use crate::output::{FrameWriter, OutputFormat};
use crate::renderer::camera::Camera;
use crate::renderer::offscreen::HeadlessState;
use crate::scene::SceneDef;

#[derive(Clone, Copy)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

/// Render the whole timeline offline, streaming frames to the writer.
pub fn render_scene(
    scene: &SceneDef,
    settings: RenderSettings,
    format: OutputFormat,
    out_dir: &Path,
) -> Result<()> {
    let state = pollster::block_on(HeadlessState::new(settings.width, settings.height))?;

    let primitives = scene.build();
    let mut state = state;
    state.core.buffers.upload(&state.core.queue, &primitives);

    let mut camera = Camera::from_orientation(
        &scene.camera,
        settings.width as f32 / settings.height as f32,
    );
    let base_theta = camera.theta;

    let duration = scene.timeline.duration();
    let frame_count = ((duration * settings.frame_rate as f32).ceil() as usize).max(1);

    log::info!(
        "rendering '{}': {} frames at {}x{} / {} fps",
        scene.name,
        frame_count,
        settings.width,
        settings.height,
        settings.frame_rate
    );

    let writer = FrameWriter::spawn(
        format,
        out_dir.to_path_buf(),
        scene.name,
        settings.width,
        settings.height,
        settings.frame_rate,
    )?;

    for frame in 0..frame_count {
        let t = frame as f32 / settings.frame_rate as f32;
        let playback = scene.timeline.sample(t);

        camera.theta = base_theta + playback.theta_offset;
        state.core.update_camera(&camera);

        let rgba = state.render_frame(&playback)?;
        writer.push_frame(frame, rgba)?;

        if frame % settings.frame_rate.max(1) as usize == 0 {
            log::debug!("frame {frame}/{frame_count}");
        }
    }

    writer.finish()?;
    log::info!("done: {} frames written to {}", frame_count, out_dir.display());
    Ok(())
}
