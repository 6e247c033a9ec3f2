use glam::DVec3;

use crate::color::{self, normalize};
use crate::scene::{AxesDef, FillStyle, SurfaceDef};

/// Grid resolution for the gradient normalization bounds, independent
/// of the render tessellation.
const BOUNDS_RESOLUTION: usize = 40;

/// Lift of the stroke lines off the surface, in scene units.
const STROKE_OFFSET: f64 = 0.008;

const TICK_HALF_LENGTH: f32 = 0.1;

pub struct TriangleMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Line list: consecutive vertex pairs form segments.
pub struct LineSet {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
}

impl LineSet {
    fn new() -> Self {
        Self {
            positions: Vec::new(),
            colors: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn push_segment(&mut self, a: DVec3, b: DVec3, color: [f32; 4]) {
        for p in [a, b] {
            self.positions
                .extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
            self.colors.extend_from_slice(&color);
        }
    }
}

struct SampleGrid {
    /// World-space positions, row-major over (nu + 1) × (nv + 1) samples.
    world: Vec<DVec3>,
    /// Unit normals per sample.
    normals: Vec<DVec3>,
    /// Raw (pre-anchoring) heights per sample.
    heights: Vec<f64>,
    nu: usize,
    nv: usize,
}

impl SampleGrid {
    fn at(&self, i: usize, j: usize) -> DVec3 {
        self.world[i * (self.nv + 1) + j]
    }

    fn normal_at(&self, i: usize, j: usize) -> DVec3 {
        self.normals[i * (self.nv + 1) + j]
    }

    fn height_at(&self, i: usize, j: usize) -> f64 {
        self.heights[i * (self.nv + 1) + j]
    }
}

fn sample_surface(def: &SurfaceDef, axes: &AxesDef) -> SampleGrid {
    let (nu, nv) = def.resolution;
    let du = (def.u_range.1 - def.u_range.0) / nu as f64;
    let dv = (def.v_range.1 - def.v_range.0) / nv as f64;

    let mut world = Vec::with_capacity((nu + 1) * (nv + 1));
    let mut heights = Vec::with_capacity((nu + 1) * (nv + 1));

    for i in 0..=nu {
        for j in 0..=nv {
            let u = def.u_range.0 + i as f64 * du;
            let v = def.v_range.0 + j as f64 * dv;
            let raw = (def.point)(u, v);
            let anchored = if def.anchor_to_axes {
                axes.c2p(raw)
            } else {
                raw
            };
            world.push(anchored * def.scale);
            heights.push(raw.z);
        }
    }

    let stride = nv + 1;
    let mut normals = Vec::with_capacity(world.len());
    for i in 0..=nu {
        for j in 0..=nv {
            let tangent_u = difference(&world, stride, i, j, nu, true, du);
            let tangent_v = difference(&world, stride, i, j, nv, false, dv);
            let n = tangent_u.cross(tangent_v);
            let len = n.length().max(1e-4);
            normals.push(n / len);
        }
    }

    SampleGrid {
        world,
        normals,
        heights,
        nu,
        nv,
    }
}

/// Central difference in the interior, one-sided on the boundary.
fn difference(
    world: &[DVec3],
    stride: usize,
    i: usize,
    j: usize,
    count: usize,
    along_u: bool,
    delta: f64,
) -> DVec3 {
    let at = |i: usize, j: usize| world[i * stride + j];
    let k = if along_u { i } else { j };
    let (prev, next, span) = if k > 0 && k < count {
        (k - 1, k + 1, 2.0 * delta)
    } else if k == 0 {
        (k, k + 1, delta)
    } else {
        (k - 1, k, delta)
    };

    let (a, b) = if along_u {
        (at(prev, j), at(next, j))
    } else {
        (at(i, prev), at(i, next))
    };
    (b - a) / span
}

pub fn tessellate_surface(def: &SurfaceDef, axes: &AxesDef) -> (TriangleMesh, Option<LineSet>) {
    let grid = sample_surface(def, axes);

    let bounds = crate::math::sample_bounds(def.point, def.u_range, def.v_range, BOUNDS_RESOLUTION);

    let vertex_color = |i: usize, j: usize, face_i: usize, face_j: usize| -> [f32; 4] {
        let color = match def.fill {
            FillStyle::HeightGradient(gradient) => {
                gradient.sample(normalize(grid.height_at(i, j), bounds.min, bounds.max) as f32)
            }
            FillStyle::Checkerboard(a, b) => color::checkerboard(face_i, face_j, a, b),
        };
        color.with_alpha(def.opacity)
    };

    let quad_count = grid.nu * grid.nv;
    let mut mesh = TriangleMesh {
        positions: Vec::with_capacity(quad_count * 4 * 3),
        normals: Vec::with_capacity(quad_count * 4 * 3),
        colors: Vec::with_capacity(quad_count * 4 * 4),
        indices: Vec::with_capacity(quad_count * 6),
    };

    for i in 0..grid.nu {
        for j in 0..grid.nv {
            let base = mesh.vertex_count() as u32;
            for (di, dj) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                let (si, sj) = (i + di, j + dj);
                let p = grid.at(si, sj);
                let n = grid.normal_at(si, sj);
                mesh.positions
                    .extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
                mesh.normals
                    .extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
                mesh.colors.extend_from_slice(&vertex_color(si, sj, i, j));
            }
            // tl, bl, tr / tr, bl, br
            mesh.indices.extend_from_slice(&[
                base,
                base + 2,
                base + 1,
                base + 1,
                base + 2,
                base + 3,
            ]);
        }
    }

    let stroke = def.stroke.map(|stroke_color| {
        let rgba = stroke_color.with_alpha(def.opacity.max(0.8));
        let lift = STROKE_OFFSET * def.scale;
        let mut lines = LineSet::new();
        for i in 0..=grid.nu {
            for j in 0..grid.nv {
                let a = grid.at(i, j) + grid.normal_at(i, j) * lift;
                let b = grid.at(i, j + 1) + grid.normal_at(i, j + 1) * lift;
                lines.push_segment(a, b, rgba);
            }
        }
        for j in 0..=grid.nv {
            for i in 0..grid.nu {
                let a = grid.at(i, j) + grid.normal_at(i, j) * lift;
                let b = grid.at(i + 1, j) + grid.normal_at(i + 1, j) * lift;
                lines.push_segment(a, b, rgba);
            }
        }
        lines
    });

    (mesh, stroke)
}

/// Three axis lines with tick dashes at every step multiple.
pub fn build_axes(def: &AxesDef) -> LineSet {
    let rgba = def.color.with_alpha(1.0);
    let mut lines = LineSet::new();

    let half_x = def.x.length / 2.0;
    let half_y = def.y.length / 2.0;
    let half_z = def.z.length / 2.0;

    lines.push_segment(
        DVec3::new(-half_x, 0.0, 0.0),
        DVec3::new(half_x, 0.0, 0.0),
        rgba,
    );
    lines.push_segment(
        DVec3::new(0.0, -half_y, 0.0),
        DVec3::new(0.0, half_y, 0.0),
        rgba,
    );
    lines.push_segment(
        DVec3::new(0.0, 0.0, -half_z),
        DVec3::new(0.0, 0.0, half_z),
        rgba,
    );

    let tick = TICK_HALF_LENGTH as f64;
    for value in step_values(def.x.min, def.x.max, def.x.step) {
        let x = def.x.map(value);
        lines.push_segment(DVec3::new(x, -tick, 0.0), DVec3::new(x, tick, 0.0), rgba);
    }
    for value in step_values(def.y.min, def.y.max, def.y.step) {
        let y = def.y.map(value);
        lines.push_segment(DVec3::new(-tick, y, 0.0), DVec3::new(tick, y, 0.0), rgba);
    }
    for value in step_values(def.z.min, def.z.max, def.z.step) {
        let z = def.z.map(value);
        lines.push_segment(DVec3::new(-tick, 0.0, z), DVec3::new(tick, 0.0, z), rgba);
    }

    lines
}

/// Multiples of `step` in [min, max], excluding zero (covered by the
/// crossing axes).
fn step_values(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut values = Vec::new();
    if step <= 0.0 {
        return values;
    }
    let mut k = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    while k <= last {
        if k != 0 {
            values.push(k as f64 * step);
        }
        k += 1;
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::all_scenes;

    #[test]
    fn indices_stay_in_bounds() {
        for scene in all_scenes() {
            let (mesh, _) = tessellate_surface(&scene.surface, &scene.axes);
            let count = mesh.vertex_count() as u32;
            assert!(mesh.indices.iter().all(|&i| i < count));
            let (nu, nv) = scene.surface.resolution;
            assert_eq!(mesh.indices.len(), nu * nv * 6);
            assert_eq!(mesh.vertex_count(), nu * nv * 4);
        }
    }

    #[test]
    fn normals_are_unit_length() {
        for scene in all_scenes() {
            let (mesh, _) = tessellate_surface(&scene.surface, &scene.axes);
            for n in mesh.normals.chunks(3) {
                let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                assert!((len - 1.0).abs() < 1e-3, "normal length {len}");
            }
        }
    }

    #[test]
    fn all_positions_finite() {
        for scene in all_scenes() {
            let (mesh, stroke) = tessellate_surface(&scene.surface, &scene.axes);
            assert!(mesh.positions.iter().all(|p| p.is_finite()));
            if let Some(stroke) = stroke {
                assert!(stroke.positions.iter().all(|p| p.is_finite()));
            }
        }
    }

    #[test]
    fn checkerboard_faces_are_flat_colored() {
        let scene = crate::scene::scene_by_name("gaussian").unwrap();
        let (mesh, _) = tessellate_surface(&scene.surface, &scene.axes);
        // every quad's four vertices share one color
        for quad in mesh.colors.chunks(16) {
            let first = &quad[0..4];
            for vert in quad.chunks(4) {
                assert_eq!(vert, first);
            }
        }
    }

    #[test]
    fn axes_include_main_lines_and_ticks() {
        let scene = crate::scene::scene_by_name("cos-sin").unwrap();
        let axes = build_axes(&scene.axes);
        // 3 axis lines + ticks (x: ±π/2, ±π → 4; y same; z: ±0.5, ±1 → 4)
        assert_eq!(axes.vertex_count(), (3 + 12) * 2);
    }

    #[test]
    fn step_values_skip_zero() {
        let values = step_values(-2.0, 2.0, 1.0);
        assert_eq!(values, vec![-2.0, -1.0, 1.0, 2.0]);
    }
}
