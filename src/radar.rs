// src/radar.rs
//
// Coarse area scan for the single nearest surface in front of the user,
// independent of the classifier. A 3x3 probe grid covers the lower-center
// field of view (ahead and floor-level beats sky and ceiling), the nearest
// hit beyond the safe distance wins, and the winning point is attributed
// to whichever tracked object's box contains it, for labeling only.

use crate::distance::DepthProbe;
use crate::tracker::TrackedObject;
use crate::types::{
    DistanceConfig, ObstacleSummary, Point, RadarConfig, Rect, StatusColor, TrackingConfig,
    VelocityConfig,
};
use tracing::debug;

pub struct RadarScanner {
    radar: RadarConfig,
    distance: DistanceConfig,
    tracking: TrackingConfig,
    velocity: VelocityConfig,
    last_scan: Option<f64>,
    /// Velocity state over the winning distance stream, so the alert can
    /// carry an approach flag just like per-object tracks do.
    obstacle_state: TrackedObject,
    summary: ObstacleSummary,
}

impl RadarScanner {
    pub fn new(
        radar: RadarConfig,
        distance: DistanceConfig,
        tracking: TrackingConfig,
        velocity: VelocityConfig,
    ) -> Self {
        Self {
            radar,
            distance,
            tracking,
            velocity,
            last_scan: None,
            obstacle_state: TrackedObject::detached("Obstacle"),
            summary: ObstacleSummary::clear(),
        }
    }

    /// Run one scan if the rate limit allows. Returns `None` when inside
    /// the interval; the previous summary stays current in that case.
    pub fn scan(
        &mut self,
        probe: &dyn DepthProbe,
        tracks: &[TrackedObject],
        now: f64,
    ) -> Option<ObstacleSummary> {
        if let Some(last) = self.last_scan {
            if now - last < self.radar.interval_secs {
                return None;
            }
        }
        self.last_scan = Some(now);

        let mut closest = f32::INFINITY;
        let mut closest_point: Option<Point> = None;

        for r in 0..self.radar.rows {
            for c in 0..self.radar.cols {
                let point = Point::new(
                    grid_coord(c, self.radar.cols, self.radar.min_x, self.radar.max_x),
                    grid_coord(r, self.radar.rows, self.radar.min_y, self.radar.max_y),
                );
                if let Some(dist) = probe.probe(point) {
                    if dist > self.distance.safe_distance && dist < closest {
                        closest = dist;
                        closest_point = Some(point);
                    }
                }
            }
        }

        if let Some(point) = closest_point.filter(|_| closest < self.distance.max_distance) {
            self.obstacle_state
                .update(Rect::ZERO, closest, true, now, &self.tracking, &self.velocity);

            let label = tracks
                .iter()
                .find(|t| t.rect.contains(point))
                .map(|t| t.label.clone())
                .unwrap_or_else(|| "Obstacle".to_string());

            let is_approaching = self.obstacle_state.is_approaching(&self.velocity);
            debug!(
                "radar: {} at {:.2}m ({:.2},{:.2}){}",
                label,
                closest,
                point.x,
                point.y,
                if is_approaching { " APPROACHING" } else { "" }
            );

            self.summary = ObstacleSummary {
                label,
                distance: closest,
                screen_point: Some(point),
                is_approaching,
                color: if is_approaching {
                    StatusColor::Red
                } else {
                    StatusColor::Yellow
                },
            };
        } else {
            // Nothing in range. Clear the alert without pushing a bogus
            // zero into the velocity state.
            self.summary = ObstacleSummary::clear();
        }

        Some(self.summary.clone())
    }

    pub fn current(&self) -> &ObstacleSummary {
        &self.summary
    }
}

fn grid_coord(i: usize, n: usize, lo: f32, hi: f32) -> f32 {
    if n <= 1 {
        (lo + hi) * 0.5
    } else {
        lo + (i as f32 / (n - 1) as f32) * (hi - lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::ObjectTracker;
    use crate::types::Detection;

    fn scanner() -> RadarScanner {
        RadarScanner::new(
            RadarConfig::default(),
            DistanceConfig::default(),
            TrackingConfig::default(),
            VelocityConfig::default(),
        )
    }

    fn no_hit(_p: Point) -> Option<f32> {
        None
    }

    #[test]
    fn test_all_probes_fail_reports_no_obstacle() {
        let mut radar = scanner();
        let summary = radar.scan(&no_hit, &[], 0.0).unwrap();
        assert!(summary.is_clear());
        assert_eq!(summary.distance, 0.0);
        assert!(summary.screen_point.is_none());
    }

    #[test]
    fn test_single_hit_wins_and_defaults_to_obstacle_label() {
        let mut radar = scanner();
        // Only the grid center (0.5, 0.5) returns a surface
        let probe = |p: Point| -> Option<f32> {
            if (p.x - 0.5).abs() < 1e-4 && (p.y - 0.5).abs() < 1e-4 {
                Some(1.5)
            } else {
                None
            }
        };
        let summary = radar.scan(&probe, &[], 0.0).unwrap();
        assert_eq!(summary.distance, 1.5);
        assert_eq!(summary.label, "Obstacle");
        assert_eq!(summary.screen_point, Some(Point::new(0.5, 0.5)));
    }

    #[test]
    fn test_attribution_uses_containing_track_label() {
        let mut tracker = ObjectTracker::new(TrackingConfig::default(), VelocityConfig::default());
        tracker.update(
            &[Detection {
                label: "person".to_string(),
                confidence: 0.9,
                rect: Rect::new(0.4, 0.4, 0.2, 0.3),
                distance: 1.5,
                has_valid_distance: true,
            }],
            0.0,
        );

        let mut radar = scanner();
        let probe = |p: Point| -> Option<f32> {
            if (p.x - 0.5).abs() < 1e-4 && (p.y - 0.5).abs() < 1e-4 {
                Some(1.5)
            } else {
                None
            }
        };
        let summary = radar.scan(&probe, tracker.tracks(), 0.0).unwrap();
        assert_eq!(summary.label, "person");
    }

    #[test]
    fn test_nearest_hit_dominates() {
        let mut radar = scanner();
        // Left column is near, everything else far
        let probe = |p: Point| -> Option<f32> {
            if (p.x - 0.2).abs() < 1e-4 {
                Some(0.9)
            } else {
                Some(3.5)
            }
        };
        let summary = radar.scan(&probe, &[], 0.0).unwrap();
        assert_eq!(summary.distance, 0.9);
        assert_eq!(summary.screen_point.unwrap().x, 0.2);
    }

    #[test]
    fn test_hits_inside_safe_distance_ignored() {
        let mut radar = scanner();
        // 0.15 m is the user's own arm, not an obstacle
        let probe = |_p: Point| -> Option<f32> { Some(0.15) };
        let summary = radar.scan(&probe, &[], 0.0).unwrap();
        assert!(summary.is_clear());
    }

    #[test]
    fn test_hits_beyond_max_distance_ignored() {
        let mut radar = scanner();
        let probe = |_p: Point| -> Option<f32> { Some(7.0) };
        let summary = radar.scan(&probe, &[], 0.0).unwrap();
        assert!(summary.is_clear());
    }

    #[test]
    fn test_rate_limit() {
        let mut radar = scanner();
        assert!(radar.scan(&no_hit, &[], 0.0).is_some());
        // Inside the 0.15s interval: no scan, previous summary stands
        assert!(radar.scan(&no_hit, &[], 0.1).is_none());
        assert!(radar.scan(&no_hit, &[], 0.16).is_some());
    }

    #[test]
    fn test_approach_flag_over_consecutive_scans() {
        let mut radar = scanner();
        let make_probe = |d: f32| move |_p: Point| -> Option<f32> { Some(d) };

        let s0 = radar.scan(&make_probe(3.0), &[], 0.0).unwrap();
        assert!(!s0.is_approaching);

        // Surface closes in by 1 m in 0.2 s
        let s1 = radar.scan(&make_probe(2.0), &[], 0.2).unwrap();
        assert!(s1.is_approaching);
        assert_eq!(s1.color, StatusColor::Red);
    }

    #[test]
    fn test_clear_scan_does_not_corrupt_approach_state() {
        let mut radar = scanner();
        let make_probe = |d: Option<f32>| move |_p: Point| -> Option<f32> { d };

        radar.scan(&make_probe(Some(3.0)), &[], 0.0);
        // Dropout: no hits this cycle
        let cleared = radar.scan(&make_probe(None), &[], 0.2).unwrap();
        assert!(cleared.is_clear());

        // Recovery at nearly the same range must not look like a sudden
        // approach from zero
        let recovered = radar.scan(&make_probe(Some(2.95)), &[], 0.4).unwrap();
        assert!(!recovered.is_approaching);
    }
}
