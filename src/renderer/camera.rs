use glam::{Mat4, Vec3};

use crate::scene::CameraOrientation;

const MIN_PHI: f32 = 0.05;
const MAX_PHI: f32 = std::f32::consts::PI - 0.05;

/// Orbit camera around a target, z-up. `phi` is the angle from the
/// vertical, `theta` the azimuth, matching the scene definitions.
pub struct Camera {
    pub phi: f32,
    pub theta: f32,
    pub distance: f32,
    pub target: Vec3,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            phi: 65.0_f32.to_radians(),
            theta: -45.0_f32.to_radians(),
            distance: 9.0,
            target: Vec3::ZERO,

            fov: 50.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

impl Camera {
    pub fn from_orientation(orientation: &CameraOrientation, aspect: f32) -> Self {
        Self {
            phi: orientation.phi_deg.to_radians().clamp(MIN_PHI, MAX_PHI),
            theta: orientation.theta_deg.to_radians(),
            distance: orientation.distance,
            aspect,
            ..Self::default()
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.target
            + Vec3::new(
                self.distance * self.phi.sin() * self.theta.cos(),
                self.distance * self.phi.sin() * self.theta.sin(),
                self.distance * self.phi.cos(),
            )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Z)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn orbit(&mut self, d_theta: f32, d_phi: f32) {
        self.theta += d_theta;
        self.phi = (self.phi + d_phi).clamp(MIN_PHI, MAX_PHI);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta * 0.5).clamp(2.0, 60.0);
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height.max(1.0);
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.eye().to_array(),
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_sits_near_vertical_axis_at_min_phi() {
        let mut camera = Camera::default();
        camera.phi = MIN_PHI;
        camera.theta = 0.0;
        let eye = camera.eye();
        assert!(eye.z > camera.distance * 0.99);
        assert!(eye.x.abs() < camera.distance * 0.1);
    }

    #[test]
    fn view_projection_is_finite() {
        let camera = Camera::default();
        let m = camera.view_projection_matrix();
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn orbit_clamps_phi() {
        let mut camera = Camera::default();
        camera.orbit(0.0, 100.0);
        assert!(camera.phi <= MAX_PHI);
        camera.orbit(0.0, -200.0);
        assert!(camera.phi >= MIN_PHI);
    }
}
