use std::f64::consts::PI;

use glam::DVec3;

use crate::color;
use crate::scene::{
    AxesDef, AxisRange, CameraOrientation, FillStyle, SceneDef, Segment, SurfaceDef, Timeline,
};

fn cos_sin_point(u: f64, v: f64) -> DVec3 {
    DVec3::new(u, v, u.cos() * v.sin())
}

const GAUSS_SIGMA: f64 = 0.4;

fn gaussian_point(u: f64, v: f64) -> DVec3 {
    let d_sq = u * u + v * v;
    DVec3::new(u, v, (-d_sq / (2.0 * GAUSS_SIGMA * GAUSS_SIGMA)).exp())
}

fn cos_sin_scene() -> SceneDef {
    SceneDef {
        name: "cos-sin",
        description: "z = cos(x)·sin(y) with height-gradient coloring and camera rotation",
        axes: AxesDef {
            x: AxisRange {
                min: -PI,
                max: PI,
                step: PI / 2.0,
                length: 6.0,
            },
            y: AxisRange {
                min: -PI,
                max: PI,
                step: PI / 2.0,
                length: 6.0,
            },
            z: AxisRange {
                min: -1.25,
                max: 1.25,
                step: 0.5,
                length: 3.0,
            },
            color: color::LIGHT_GREY,
        },
        surface: SurfaceDef {
            point: cos_sin_point,
            u_range: (-PI, PI),
            v_range: (-PI, PI),
            resolution: (96, 96),
            anchor_to_axes: true,
            scale: 1.0,
            fill: FillStyle::HeightGradient(color::HEIGHT_GRADIENT),
            opacity: 0.95,
            stroke: Some(color::BLACK),
        },
        camera: CameraOrientation {
            phi_deg: 65.0,
            theta_deg: -45.0,
            distance: 9.0,
        },
        timeline: Timeline::new(vec![
            Segment::Reveal {
                axes_seconds: 1.0,
                surface_seconds: 2.0,
            },
            Segment::Wait { seconds: 0.5 },
            Segment::Orbit {
                rate: 0.25,
                seconds: 6.0,
            },
            Segment::Wait { seconds: 0.5 },
        ]),
    }
}

fn gaussian_scene() -> SceneDef {
    SceneDef {
        name: "gaussian",
        description: "2D Gaussian bump with checkerboard face coloring",
        axes: AxesDef {
            x: AxisRange {
                min: -6.0,
                max: 6.0,
                step: 1.0,
                length: 10.5,
            },
            y: AxisRange {
                min: -6.0,
                max: 6.0,
                step: 1.0,
                length: 10.5,
            },
            z: AxisRange {
                min: -4.0,
                max: 4.0,
                step: 1.0,
                length: 6.5,
            },
            color: color::LIGHT_GREY,
        },
        surface: SurfaceDef {
            point: gaussian_point,
            u_range: (-2.0, 2.0),
            v_range: (-2.0, 2.0),
            resolution: (24, 24),
            anchor_to_axes: false,
            scale: 2.0,
            fill: FillStyle::Checkerboard(color::ORANGE, color::BLUE),
            opacity: 0.5,
            stroke: Some(color::GREEN),
        },
        camera: CameraOrientation {
            phi_deg: 75.0,
            theta_deg: -30.0,
            distance: 9.0,
        },
        // No animation upstream; hold one second so the clip is non-empty.
        timeline: Timeline::new(vec![Segment::Wait { seconds: 1.0 }]),
    }
}

pub const SCENE_NAMES: &[&str] = &["cos-sin", "gaussian"];

pub fn scene_by_name(name: &str) -> Option<SceneDef> {
    match name {
        "cos-sin" => Some(cos_sin_scene()),
        "gaussian" => Some(gaussian_scene()),
        _ => None,
    }
}

/// All built-in scenes, in CLI listing order.
pub fn all_scenes() -> Vec<SceneDef> {
    SCENE_NAMES
        .iter()
        .filter_map(|name| scene_by_name(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scene_resolves() {
        for name in SCENE_NAMES {
            assert!(scene_by_name(name).is_some(), "missing scene {name}");
        }
        assert!(scene_by_name("nope").is_none());
    }

    #[test]
    fn cos_sin_samples_are_finite_and_bounded() {
        let n = 40;
        for i in 0..n {
            for j in 0..n {
                let u = -PI + 2.0 * PI * i as f64 / (n - 1) as f64;
                let v = -PI + 2.0 * PI * j as f64 / (n - 1) as f64;
                let p = cos_sin_point(u, v);
                assert!(p.z.is_finite());
                assert!(p.z.abs() <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn gaussian_samples_are_finite_and_peak_at_origin() {
        let n = 24;
        for i in 0..n {
            for j in 0..n {
                let u = -2.0 + 4.0 * i as f64 / (n - 1) as f64;
                let v = -2.0 + 4.0 * j as f64 / (n - 1) as f64;
                let p = gaussian_point(u, v);
                assert!(p.z.is_finite());
                assert!(p.z > 0.0 && p.z <= 1.0);
            }
        }
        assert!((gaussian_point(0.0, 0.0).z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn timelines_have_positive_duration() {
        for scene in all_scenes() {
            assert!(scene.timeline.duration() > 0.0);
        }
    }
}
