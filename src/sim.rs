// src/sim.rs
//
// Closed-loop simulated scene for running the pipeline without camera or
// depth hardware: one pedestrian walks toward the user while the floor
// fills the lower field of view. The depth probe and the classifier both
// read from the same scene so their observations stay consistent.

use crate::distance::DepthProbe;
use crate::errors::PerceptionError;
use crate::session::{FrameClassifier, FrameHandle, FrameSource};
use crate::types::{Point, RawDetection, Rect};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct SceneConfig {
    /// Starting range of the walker (meters).
    pub start_distance: f32,
    /// Closing speed (m/s).
    pub approach_speed: f32,
    /// Range at which the walker stops.
    pub stop_distance: f32,
    /// Flat floor return for probes in the lower view.
    pub floor_distance: f32,
    pub label: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            start_distance: 4.0,
            approach_speed: 0.8,
            stop_distance: 0.6,
            floor_distance: 3.5,
            label: "person".to_string(),
        }
    }
}

/// Shared scene state. Time is wall-clock since creation, matching the
/// session's clock.
pub struct SimulatedScene {
    config: SceneConfig,
    started: Instant,
}

impl SimulatedScene {
    pub fn new(config: SceneConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            started: Instant::now(),
        })
    }

    fn walker_distance(&self) -> f32 {
        let t = self.started.elapsed().as_secs_f32();
        (self.config.start_distance - self.config.approach_speed * t)
            .max(self.config.stop_distance)
    }

    /// Apparent box grows as the walker closes in.
    fn walker_rect(&self) -> Rect {
        let d = self.walker_distance();
        let w = (0.5 / d).clamp(0.08, 0.6);
        let h = (w * 1.6).min(0.8);
        Rect::new(0.5 - w * 0.5, 0.55 - h * 0.5, w, h)
    }
}

impl DepthProbe for SimulatedScene {
    fn probe(&self, point: Point) -> Option<f32> {
        if self.walker_rect().contains(point) {
            Some(self.walker_distance())
        } else if point.y > 0.7 {
            Some(self.config.floor_distance)
        } else {
            // Open air: nothing to hit
            None
        }
    }
}

/// Classifier stand-in: reports the walker's box with detector-like
/// jitter and a small fixed inference cost.
pub struct SceneClassifier {
    scene: Arc<SimulatedScene>,
    inference_cost: Duration,
}

impl SceneClassifier {
    pub fn new(scene: Arc<SimulatedScene>) -> Result<Self, PerceptionError> {
        Ok(Self {
            scene,
            inference_cost: Duration::from_millis(20),
        })
    }
}

impl FrameClassifier for SceneClassifier {
    fn classify(&self, _frame: &FrameHandle) -> Result<Vec<RawDetection>, PerceptionError> {
        std::thread::sleep(self.inference_cost);

        let mut rng = rand::rng();
        let rect = self.scene.walker_rect();
        let jitter = |r: &mut rand::rngs::ThreadRng| r.random_range(-0.01..0.01f32);

        Ok(vec![RawDetection {
            label: self.scene.config.label.clone(),
            confidence: rng.random_range(0.75..0.95),
            rect: Rect::new(
                (rect.x + jitter(&mut rng)).clamp(0.0, 1.0),
                (rect.y + jitter(&mut rng)).clamp(0.0, 1.0),
                rect.w,
                rect.h,
            ),
        }])
    }
}

/// Camera stand-in yielding frames at a fixed rate for a bounded run.
pub struct SceneFrameSource {
    remaining: u32,
    frame_gap: Duration,
    next_id: u64,
}

impl SceneFrameSource {
    pub fn new(frames: u32, fps: f64) -> Self {
        Self {
            remaining: frames,
            frame_gap: Duration::from_secs_f64(1.0 / fps),
            next_id: 0,
        }
    }
}

impl FrameSource for SceneFrameSource {
    fn next_frame(&mut self) -> Option<FrameHandle> {
        if self.remaining == 0 {
            return None;
        }
        std::thread::sleep(self.frame_gap);
        self.remaining -= 1;
        self.next_id += 1;
        Some(FrameHandle {
            id: self.next_id,
            timestamp: self.next_id as f64 * self.frame_gap.as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_hits_walker_and_floor() {
        let scene = SimulatedScene::new(SceneConfig::default());
        // Walker center is always probeable
        assert!(scene.probe(Point::new(0.5, 0.55)).is_some());
        // Lower view hits the floor
        assert_eq!(scene.probe(Point::new(0.1, 0.8)), Some(3.5));
        // Upper corner is open air
        assert!(scene.probe(Point::new(0.05, 0.05)).is_none());
    }

    #[test]
    fn test_classifier_reports_walker() {
        let scene = SimulatedScene::new(SceneConfig::default());
        let classifier = SceneClassifier::new(Arc::clone(&scene)).unwrap();
        let dets = classifier
            .classify(&FrameHandle {
                id: 1,
                timestamp: 0.0,
            })
            .unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "person");
        assert!(dets[0].confidence >= 0.75);
    }

    #[test]
    fn test_walker_never_passes_stop_distance() {
        let scene = SimulatedScene::new(SceneConfig {
            start_distance: 0.5,
            ..SceneConfig::default()
        });
        assert!(scene.walker_distance() >= 0.5999);
    }
}
