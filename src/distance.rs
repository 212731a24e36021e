// src/distance.rs
//
// Distance estimation for one detection box: probe 5 points (center plus
// 4 inset corners) and keep the nearest valid hit. The nearest surface
// point dominates, which is the conservative choice for a safety alert.

use crate::types::{DistanceConfig, Point, Rect};

/// Boundary to the depth-probing subsystem. `None` is a normal outcome
/// (no depth data along that ray), never an error.
pub trait DepthProbe {
    fn probe(&self, point: Point) -> Option<f32>;
}

impl<F> DepthProbe for F
where
    F: Fn(Point) -> Option<f32>,
{
    fn probe(&self, point: Point) -> Option<f32> {
        self(point)
    }
}

/// One distance estimate. `valid == false` means every probe failed and
/// `meters` is only the area heuristic; downstream velocity logic must not
/// trust it.
#[derive(Debug, Clone, Copy)]
pub struct DistanceSample {
    pub meters: f32,
    pub valid: bool,
}

pub struct DistanceMeasurer {
    config: DistanceConfig,
}

impl DistanceMeasurer {
    pub fn new(config: DistanceConfig) -> Self {
        Self { config }
    }

    pub fn measure(&self, rect: Rect, probe: &dyn DepthProbe) -> DistanceSample {
        let o = self.config.corner_offset;
        let points = [
            rect.center(),
            Point::new(rect.x + rect.w * o, rect.y + rect.h * o),
            Point::new(rect.x + rect.w * (1.0 - o), rect.y + rect.h * o),
            Point::new(rect.x + rect.w * o, rect.y + rect.h * (1.0 - o)),
            Point::new(rect.x + rect.w * (1.0 - o), rect.y + rect.h * (1.0 - o)),
        ];

        let mut nearest: Option<f32> = None;
        for point in points {
            if let Some(dist) = probe.probe(point) {
                if dist.is_finite() && dist > self.config.min_distance {
                    nearest = Some(match nearest {
                        Some(best) => best.min(dist),
                        None => dist,
                    });
                }
            }
        }

        match nearest {
            Some(meters) => DistanceSample {
                meters,
                valid: true,
            },
            None => DistanceSample {
                meters: self.heuristic_estimate(rect),
                valid: false,
            },
        }
    }

    /// No depth data at all: guess from apparent size. Bigger boxes are
    /// assumed closer. Always clamped into the usable distance band.
    fn heuristic_estimate(&self, rect: Rect) -> f32 {
        let raw = self.config.area_gain / (rect.area() + self.config.area_epsilon);
        raw.clamp(self.config.min_distance, self.config.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Probe stub that hands out a scripted answer per call, in order.
    struct ScriptedProbe {
        answers: RefCell<Vec<Option<f32>>>,
    }

    impl ScriptedProbe {
        fn new(mut answers: Vec<Option<f32>>) -> Self {
            answers.reverse();
            Self {
                answers: RefCell::new(answers),
            }
        }
    }

    impl DepthProbe for ScriptedProbe {
        fn probe(&self, _point: Point) -> Option<f32> {
            self.answers.borrow_mut().pop().flatten()
        }
    }

    fn measurer() -> DistanceMeasurer {
        DistanceMeasurer::new(DistanceConfig::default())
    }

    #[test]
    fn test_minimum_of_valid_hits_wins() {
        let probe = ScriptedProbe::new(vec![
            Some(3.0),
            None,
            Some(2.4),
            Some(4.8),
            None,
        ]);
        let sample = measurer().measure(Rect::new(0.4, 0.4, 0.2, 0.3), &probe);
        assert!(sample.valid);
        assert_eq!(sample.meters, 2.4);
    }

    #[test]
    fn test_hits_below_min_distance_are_noise() {
        // 0.05 m is inside the sensor noise band and must be discarded
        let probe = ScriptedProbe::new(vec![Some(0.05), None, None, None, Some(1.9)]);
        let sample = measurer().measure(Rect::new(0.4, 0.4, 0.2, 0.3), &probe);
        assert!(sample.valid);
        assert_eq!(sample.meters, 1.9);
    }

    #[test]
    fn test_all_probes_fail_falls_back_to_heuristic() {
        let cfg = DistanceConfig::default();
        let probe = |_p: Point| -> Option<f32> { None };
        let sample = measurer().measure(Rect::new(0.4, 0.4, 0.2, 0.3), &probe);
        assert!(!sample.valid);
        assert!(sample.meters >= cfg.min_distance);
        assert!(sample.meters <= cfg.max_distance);
        // area 0.06 with default gain 0.18 lands near 3 m
        assert!((sample.meters - 0.18 / (0.06 + 1e-3)).abs() < 1e-3);
    }

    #[test]
    fn test_heuristic_clamps_tiny_and_huge_boxes() {
        let cfg = DistanceConfig::default();
        let probe = |_p: Point| -> Option<f32> { None };
        let m = measurer();

        // Tiny box: unclamped estimate would be far past max_distance
        let far = m.measure(Rect::new(0.5, 0.5, 0.01, 0.01), &probe);
        assert!(!far.valid);
        assert_eq!(far.meters, cfg.max_distance);

        // Full-screen box: estimate floors at min_distance side of the band
        let near = m.measure(Rect::new(0.0, 0.0, 1.0, 1.0), &probe);
        assert!(!near.valid);
        assert!(near.meters >= cfg.min_distance);
        assert!(near.meters <= cfg.max_distance);
    }

    #[test]
    fn test_infinite_hits_are_discarded() {
        let probe = ScriptedProbe::new(vec![
            Some(f32::INFINITY),
            None,
            None,
            None,
            None,
        ]);
        let sample = measurer().measure(Rect::new(0.4, 0.4, 0.2, 0.3), &probe);
        assert!(!sample.valid);
    }
}
