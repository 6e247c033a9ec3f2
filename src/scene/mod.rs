pub mod presets;
pub mod timeline;

pub use presets::{SCENE_NAMES, all_scenes, scene_by_name};
pub use timeline::{Playback, Segment, Timeline};

use glam::DVec3;

use crate::color::{Color, Gradient};
use crate::math::mesh::{LineSet, TriangleMesh, build_axes, tessellate_surface};

pub type PointFn = fn(f64, f64) -> DVec3;

#[derive(Clone, Copy)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub length: f64,
}

impl AxisRange {
    /// Scene units per axis unit. The epsilon keeps a degenerate range
    /// from dividing by zero.
    pub fn unit(&self) -> f64 {
        self.length / (self.max - self.min).max(1e-9)
    }

    /// Map an axis coordinate to scene units, centered on the range midpoint.
    pub fn map(&self, value: f64) -> f64 {
        (value - (self.min + self.max) / 2.0) * self.unit()
    }
}

#[derive(Clone, Copy)]
pub struct AxesDef {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
    pub color: Color,
}

impl AxesDef {
    /// Coordinate-to-point: axis-space coordinates into scene units.
    pub fn c2p(&self, p: DVec3) -> DVec3 {
        DVec3::new(self.x.map(p.x), self.y.map(p.y), self.z.map(p.z))
    }
}

#[derive(Clone, Copy)]
pub enum FillStyle {
    /// Per-vertex color from the raw height normalized by sampled bounds.
    HeightGradient(Gradient),
    /// Flat per-face color alternating by grid parity.
    Checkerboard(Color, Color),
}

#[derive(Clone, Copy)]
pub struct SurfaceDef {
    pub point: PointFn,
    pub u_range: (f64, f64),
    pub v_range: (f64, f64),
    /// Quad count along u and v.
    pub resolution: (usize, usize),
    /// Route parameter-space points through the axes mapping.
    pub anchor_to_axes: bool,
    /// Uniform scale about the origin, applied after anchoring.
    pub scale: f64,
    pub fill: FillStyle,
    pub opacity: f32,
    pub stroke: Option<Color>,
}

#[derive(Clone, Copy)]
pub struct CameraOrientation {
    /// Angle from the vertical (+z), degrees.
    pub phi_deg: f32,
    /// Azimuth, degrees.
    pub theta_deg: f32,
    pub distance: f32,
}

pub struct SceneDef {
    pub name: &'static str,
    pub description: &'static str,
    pub axes: AxesDef,
    pub surface: SurfaceDef,
    pub camera: CameraOrientation,
    pub timeline: Timeline,
}

/// Geometry for one scene, ready for upload.
pub struct ScenePrimitives {
    pub axes: LineSet,
    pub surface: TriangleMesh,
    pub stroke: Option<LineSet>,
}

pub enum Primitive<'a> {
    Lines(&'a LineSet),
    Triangles(&'a TriangleMesh),
}

impl ScenePrimitives {
    pub fn primitives(&self) -> Vec<Primitive<'_>> {
        let mut out = vec![
            Primitive::Lines(&self.axes),
            Primitive::Triangles(&self.surface),
        ];
        if let Some(stroke) = &self.stroke {
            out.push(Primitive::Lines(stroke));
        }
        out
    }
}

impl SceneDef {
    pub fn build(&self) -> ScenePrimitives {
        let axes = build_axes(&self.axes);
        let (surface, stroke) = tessellate_surface(&self.surface, &self.axes);
        ScenePrimitives {
            axes,
            surface,
            stroke,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_map_is_centered_and_linear() {
        let axis = AxisRange {
            min: -2.0,
            max: 2.0,
            step: 1.0,
            length: 8.0,
        };
        assert!((axis.map(0.0)).abs() < 1e-12);
        assert!((axis.map(2.0) - 4.0).abs() < 1e-12);
        assert!((axis.map(-2.0) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_axis_range_maps_finitely() {
        let axis = AxisRange {
            min: 1.0,
            max: 1.0,
            step: 1.0,
            length: 4.0,
        };
        assert!(axis.unit().is_finite());
        assert!(axis.map(1.0).is_finite());
    }

    #[test]
    fn both_scenes_produce_nonempty_primitives() {
        for scene in all_scenes() {
            let built = scene.build();
            let prims = built.primitives();
            assert!(prims.len() >= 2, "{}: axes plus surface expected", scene.name);
            assert!(built.axes.vertex_count() > 0);
            assert!(built.surface.vertex_count() > 0);
            assert!(!built.surface.indices.is_empty());
        }
    }
}
