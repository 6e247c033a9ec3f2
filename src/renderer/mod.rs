pub mod camera;
pub mod gpu;
pub mod headless;
pub mod offscreen;

pub use camera::Camera;
pub use gpu::GpuState;
pub use headless::{RenderSettings, render_scene};
