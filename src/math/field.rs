use crate::scene::PointFn;

/// Empirical height bounds used for gradient normalization.
#[derive(Clone, Copy, Debug)]
pub struct HeightBounds {
    pub min: f64,
    pub max: f64,
}

/// Evaluate the height channel on a `resolution`-squared grid and take
/// min/max. Non-finite samples are skipped; a fully non-finite grid
/// collapses to (0, 0).
pub fn sample_bounds(
    point: PointFn,
    u_range: (f64, f64),
    v_range: (f64, f64),
    resolution: usize,
) -> HeightBounds {
    let mut min = f64::MAX;
    let mut max = f64::MIN;

    for i in 0..resolution {
        for j in 0..resolution {
            let u = lerp_step(u_range, i, resolution);
            let v = lerp_step(v_range, j, resolution);
            let z = point(u, v).z;
            if z.is_finite() {
                min = min.min(z);
                max = max.max(z);
            }
        }
    }

    if min > max {
        return HeightBounds { min: 0.0, max: 0.0 };
    }
    HeightBounds { min, max }
}

fn lerp_step(range: (f64, f64), i: usize, count: usize) -> f64 {
    if count <= 1 {
        return range.0;
    }
    range.0 + (range.1 - range.0) * i as f64 / (count - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use std::f64::consts::PI;

    fn cos_sin(u: f64, v: f64) -> DVec3 {
        DVec3::new(u, v, u.cos() * v.sin())
    }

    fn flat(u: f64, v: f64) -> DVec3 {
        DVec3::new(u, v, 0.7)
    }

    #[test]
    fn bounds_are_ordered() {
        let b = sample_bounds(cos_sin, (-PI, PI), (-PI, PI), 40);
        assert!(b.min <= b.max);
    }

    #[test]
    fn cos_sin_bounds_reach_extremes() {
        // a 40-point grid over [-π, π]² lands close to ±1
        let b = sample_bounds(cos_sin, (-PI, PI), (-PI, PI), 40);
        assert!(b.min < -0.99);
        assert!(b.max > 0.99);
    }

    #[test]
    fn constant_surface_collapses_bounds() {
        let b = sample_bounds(flat, (0.0, 1.0), (0.0, 1.0), 8);
        assert_eq!(b.min, b.max);
        // and normalization still yields a finite value
        let t = crate::color::normalize(0.7, b.min, b.max);
        assert!(t.is_finite());
    }
}
