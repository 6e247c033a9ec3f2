#[derive(Clone, Copy)]
pub enum Segment {
    /// Draw-in of the axes and surface, running concurrently.
    Reveal {
        axes_seconds: f32,
        surface_seconds: f32,
    },
    Wait {
        seconds: f32,
    },
    /// Ambient camera rotation, radians per second.
    Orbit {
        rate: f32,
        seconds: f32,
    },
}

impl Segment {
    pub fn duration(&self) -> f32 {
        match *self {
            Segment::Reveal {
                axes_seconds,
                surface_seconds,
            } => axes_seconds.max(surface_seconds),
            Segment::Wait { seconds } | Segment::Orbit { seconds, .. } => seconds,
        }
    }
}

/// State of the animation at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playback {
    pub axes_reveal: f32,
    pub surface_reveal: f32,
    pub theta_offset: f32,
}

pub struct Timeline {
    segments: Vec<Segment>,
}

impl Timeline {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn duration(&self) -> f32 {
        self.segments.iter().map(Segment::duration).sum()
    }

    /// Sample the timeline at `t` seconds. Times past the end clamp to
    /// the final state; a timeline without a reveal starts fully drawn.
    pub fn sample(&self, t: f32) -> Playback {
        let has_reveal = self
            .segments
            .iter()
            .any(|s| matches!(s, Segment::Reveal { .. }));
        let initial = if has_reveal { 0.0 } else { 1.0 };

        let mut playback = Playback {
            axes_reveal: initial,
            surface_reveal: initial,
            theta_offset: 0.0,
        };

        let mut start = 0.0_f32;
        for segment in &self.segments {
            let local = (t - start).clamp(0.0, segment.duration());
            match *segment {
                Segment::Reveal {
                    axes_seconds,
                    surface_seconds,
                } => {
                    playback.axes_reveal = fraction(local, axes_seconds);
                    playback.surface_reveal = fraction(local, surface_seconds);
                }
                Segment::Wait { .. } => {}
                Segment::Orbit { rate, .. } => {
                    playback.theta_offset += rate * local;
                }
            }
            start += segment.duration();
        }

        playback
    }
}

fn fraction(elapsed: f32, total: f32) -> f32 {
    if total <= 0.0 {
        1.0
    } else {
        (elapsed / total).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbit_timeline() -> Timeline {
        Timeline::new(vec![
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
        ])
    }

    #[test]
    fn duration_sums_segments() {
        assert!((orbit_timeline().duration() - 9.0).abs() < 1e-6);
    }

    #[test]
    fn reveal_starts_hidden_and_completes() {
        let tl = orbit_timeline();
        let start = tl.sample(0.0);
        assert_eq!(start.axes_reveal, 0.0);
        assert_eq!(start.surface_reveal, 0.0);

        let mid = tl.sample(1.0);
        assert!((mid.axes_reveal - 1.0).abs() < 1e-6);
        assert!((mid.surface_reveal - 0.5).abs() < 1e-6);

        let done = tl.sample(2.0);
        assert_eq!(done.surface_reveal, 1.0);
    }

    #[test]
    fn orbit_accumulates_then_clamps() {
        let tl = orbit_timeline();
        // halfway through the rotation segment
        let half = tl.sample(2.5 + 3.0);
        assert!((half.theta_offset - 0.25 * 3.0).abs() < 1e-5);

        let end = tl.sample(100.0);
        assert!((end.theta_offset - 0.25 * 6.0).abs() < 1e-5);
        assert_eq!(end.axes_reveal, 1.0);
    }

    #[test]
    fn reveal_fractions_are_monotonic() {
        let tl = orbit_timeline();
        let mut prev = -1.0_f32;
        for i in 0..=90 {
            let pb = tl.sample(i as f32 * 0.1);
            assert!(pb.surface_reveal >= prev);
            assert!((0.0..=1.0).contains(&pb.surface_reveal));
            prev = pb.surface_reveal;
        }
    }

    #[test]
    fn static_timeline_starts_fully_drawn() {
        let tl = Timeline::new(vec![Segment::Wait { seconds: 1.0 }]);
        let pb = tl.sample(0.0);
        assert_eq!(pb.axes_reveal, 1.0);
        assert_eq!(pb.surface_reveal, 1.0);
        assert_eq!(pb.theta_offset, 0.0);
    }
}
