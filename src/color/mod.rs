#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    pub fn with_alpha(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

// Palette matching the upstream animation tool.
pub const BLUE: Color = Color::from_rgb(0x58, 0xC4, 0xDD);
pub const GREEN: Color = Color::from_rgb(0x83, 0xC1, 0x67);
pub const YELLOW: Color = Color::from_rgb(0xFF, 0xFF, 0x00);
pub const RED: Color = Color::from_rgb(0xFC, 0x62, 0x55);
pub const ORANGE: Color = Color::from_rgb(0xFF, 0x86, 0x2F);
pub const BLACK: Color = Color::from_rgb(0x00, 0x00, 0x00);
pub const LIGHT_GREY: Color = Color::from_rgb(0xBB, 0xBB, 0xBB);

const NORM_EPSILON: f64 = 1e-9;

/// Map a sampled height into [0, 1] given empirical bounds. The epsilon
/// keeps the denominator non-zero when every sample is equal.
pub fn normalize(z: f64, min: f64, max: f64) -> f64 {
    ((z - min) / (max - min + NORM_EPSILON)).clamp(0.0, 1.0)
}

/// Piecewise-linear gradient over a fixed sequence of color stops.
#[derive(Clone, Copy)]
pub struct Gradient {
    stops: &'static [Color],
}

impl Gradient {
    pub const fn new(stops: &'static [Color]) -> Self {
        debug_assert!(stops.len() >= 2);
        Self { stops }
    }

    pub fn sample(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (self.stops.len() - 1) as f32;
        let i = (scaled.floor() as usize).min(self.stops.len() - 2);
        self.stops[i].lerp(self.stops[i + 1], scaled - i as f32)
    }
}

pub const HEIGHT_GRADIENT: Gradient = Gradient::new(&[BLUE, GREEN, YELLOW, RED]);

/// Alternating face color by grid parity.
pub fn checkerboard(i: usize, j: usize, a: Color, b: Color) -> Color {
    if (i + j) % 2 == 0 { a } else { b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_bounds_to_unit_interval() {
        let (min, max) = (-1.0, 1.0);
        assert!(normalize(min, min, max).abs() < 1e-6);
        assert!((normalize(max, min, max) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_is_monotonic() {
        let (min, max) = (-2.5, 3.5);
        let mut prev = -1.0;
        for step in 0..=100 {
            let z = min + (max - min) * step as f64 / 100.0;
            let t = normalize(z, min, max);
            assert!(t >= prev);
            prev = t;
        }
    }

    #[test]
    fn normalize_survives_degenerate_bounds() {
        let t = normalize(0.7, 0.7, 0.7);
        assert!(t.is_finite());
        assert!(t.abs() < 1e-6);
    }

    #[test]
    fn gradient_hits_stops() {
        let g = HEIGHT_GRADIENT;
        assert_eq!(g.sample(0.0), BLUE);
        assert_eq!(g.sample(1.0), RED);
        // interior stops land at thirds for a 4-stop gradient
        let mid = g.sample(1.0 / 3.0);
        assert!((mid.r - GREEN.r).abs() < 1e-5);
        assert!((mid.g - GREEN.g).abs() < 1e-5);
    }

    #[test]
    fn gradient_clamps_out_of_range() {
        assert_eq!(HEIGHT_GRADIENT.sample(-2.0), BLUE);
        assert_eq!(HEIGHT_GRADIENT.sample(5.0), RED);
    }

    #[test]
    fn checkerboard_alternates() {
        assert_eq!(checkerboard(0, 0, ORANGE, BLUE), ORANGE);
        assert_eq!(checkerboard(0, 1, ORANGE, BLUE), BLUE);
        assert_eq!(checkerboard(1, 0, ORANGE, BLUE), BLUE);
        assert_eq!(checkerboard(1, 1, ORANGE, BLUE), ORANGE);
    }
}
