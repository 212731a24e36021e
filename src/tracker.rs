// src/tracker.rs
//
// Frame-over-frame identity for detected objects. Matching is greedy in
// track iteration order: same-label best IoU first, nearest same-label
// center as a fallback, each detection consumed at most once. The order
// sensitivity under ambiguous overlaps is accepted; a global assignment
// would only change behavior when two tracks fight over one detection.

use crate::types::{Detection, Rect, TrackingConfig, VelocityConfig};
use std::collections::VecDeque;
use tracing::debug;

// ============================================================================
// TRACK STATE
// ============================================================================

/// One persistent physical object. Owned exclusively by the tracker;
/// consumers only ever see `&TrackedObject` snapshots.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub id: u64,
    pub label: String,
    pub rect: Rect,
    /// Monotonic timestamp of the last successful match (seconds).
    pub last_seen: f64,
    /// (timestamp, distance) pairs, oldest first, capped per config.
    pub distance_history: VecDeque<(f64, f32)>,
    /// Smoothed radial velocity in m/s. Negative = approaching.
    pub velocity: f32,
    /// Whether the latest distance came from real probe hits rather than
    /// the area heuristic.
    pub has_valid_distance: bool,
}

impl TrackedObject {
    fn new(
        id: u64,
        det: &Detection,
        now: f64,
        tracking: &TrackingConfig,
        velocity: &VelocityConfig,
    ) -> Self {
        let mut track = Self {
            id,
            label: det.label.clone(),
            rect: det.rect,
            last_seen: now,
            distance_history: VecDeque::with_capacity(tracking.history_limit),
            velocity: 0.0,
            has_valid_distance: false,
        };
        track.update(det.rect, det.distance, det.has_valid_distance, now, tracking, velocity);
        track
    }

    /// Detached state holder with no screen presence. Used by the radar
    /// fusion stage to run the same velocity estimate over its own
    /// distance stream.
    pub(crate) fn detached(label: &str) -> Self {
        Self {
            id: 0,
            label: label.to_string(),
            rect: Rect::ZERO,
            last_seen: 0.0,
            distance_history: VecDeque::new(),
            velocity: 0.0,
            has_valid_distance: false,
        }
    }

    pub(crate) fn update(
        &mut self,
        rect: Rect,
        distance: f32,
        has_valid_distance: bool,
        now: f64,
        tracking: &TrackingConfig,
        velocity: &VelocityConfig,
    ) {
        self.last_seen = now;
        self.rect = rect;
        self.has_valid_distance = has_valid_distance;

        self.distance_history.push_back((now, distance));
        while self.distance_history.len() > tracking.history_limit {
            self.distance_history.pop_front();
        }

        if has_valid_distance {
            self.recompute_velocity(velocity);
        } else {
            // Heuristic distances must not corrupt the velocity estimate
            self.velocity = 0.0;
        }
    }

    /// Differencing over the two most recent samples keeps the estimate
    /// responsive to sudden approach; the EMA then filters single-sample
    /// jitter back out.
    fn recompute_velocity(&mut self, cfg: &VelocityConfig) {
        if self.distance_history.len() < 2 {
            self.velocity = 0.0;
            return;
        }

        let newest = self.distance_history[self.distance_history.len() - 1];
        let previous = self.distance_history[self.distance_history.len() - 2];

        let time_diff = (newest.0 - previous.0) as f32;
        if time_diff > 0.0 {
            let raw = (newest.1 - previous.1) / time_diff;
            self.velocity = self.velocity * cfg.smoothing_old + raw * cfg.smoothing_new;
        }
    }

    pub fn is_approaching(&self, cfg: &VelocityConfig) -> bool {
        self.has_valid_distance && self.velocity < cfg.approaching_threshold
    }

    pub fn latest_distance(&self) -> Option<f32> {
        self.distance_history.back().map(|&(_, d)| d)
    }
}

// ============================================================================
// TRACK STORE & MATCHER
// ============================================================================

/// Track churn from one `update` call, for the pipeline's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub spawned: usize,
    pub evicted: usize,
}

pub struct ObjectTracker {
    tracking: TrackingConfig,
    velocity: VelocityConfig,
    tracks: Vec<TrackedObject>,
    next_id: u64,
}

impl ObjectTracker {
    pub fn new(tracking: TrackingConfig, velocity: VelocityConfig) -> Self {
        Self {
            tracking,
            velocity,
            tracks: Vec::with_capacity(16),
            next_id: 1,
        }
    }

    /// Process one detection batch at time `now`. Matched tracks are
    /// updated in place, unmatched detections spawn tracks, and stale
    /// tracks are evicted afterwards. An empty batch only evicts.
    pub fn update(&mut self, detections: &[Detection], now: f64) -> UpdateStats {
        let tracking = self.tracking.clone();
        let velocity = self.velocity.clone();

        // Pool of detection indices still up for grabs
        let mut unmatched: Vec<usize> = (0..detections.len()).collect();

        for track in &mut self.tracks {
            // Primary: best same-label IoU above the threshold
            let mut best_pos: Option<usize> = None;
            let mut best_iou = tracking.min_iou;
            for (pos, &di) in unmatched.iter().enumerate() {
                let det = &detections[di];
                if det.label != track.label {
                    continue;
                }
                let iou = track.rect.iou(&det.rect);
                if iou > best_iou {
                    best_iou = iou;
                    best_pos = Some(pos);
                }
            }

            // Fallback: nearest same-label center within match range
            if best_pos.is_none() {
                let mut best_dist = tracking.match_distance;
                for (pos, &di) in unmatched.iter().enumerate() {
                    let det = &detections[di];
                    if det.label != track.label {
                        continue;
                    }
                    let dist = track.rect.center_distance(&det.rect);
                    if dist < best_dist {
                        best_dist = dist;
                        best_pos = Some(pos);
                    }
                }
            }

            if let Some(pos) = best_pos {
                let di = unmatched.remove(pos);
                let det = &detections[di];
                track.update(
                    det.rect,
                    det.distance,
                    det.has_valid_distance,
                    now,
                    &tracking,
                    &velocity,
                );
            }
        }

        let spawned = unmatched.len();
        for &di in &unmatched {
            let det = &detections[di];
            let track = TrackedObject::new(self.next_id, det, now, &tracking, &velocity);
            debug!(
                "new track {} for '{}' at ({:.2},{:.2})",
                track.id, track.label, track.rect.x, track.rect.y
            );
            self.next_id += 1;
            self.tracks.push(track);
        }

        let before = self.tracks.len();
        let timeout = tracking.timeout_secs;
        self.tracks.retain(|t| {
            let stale = now - t.last_seen > timeout;
            if stale {
                debug!("evicting track {} ('{}'), unseen for {:.2}s", t.id, t.label, now - t.last_seen);
            }
            !stale
        });

        UpdateStats {
            spawned,
            evicted: before - self.tracks.len(),
        }
    }

    /// Read-only snapshot of live tracks.
    pub fn tracks(&self) -> &[TrackedObject] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================
