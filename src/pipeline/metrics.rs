// src/pipeline/metrics.rs
//
// Observability counters for the perception pipeline. Cheap atomics,
// shared by handle, summarized once at session end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub frames_seen: Arc<AtomicU64>,
    pub frames_classified: Arc<AtomicU64>,
    pub frames_skipped_busy: Arc<AtomicU64>,
    pub detections_accepted: Arc<AtomicU64>,
    pub detections_rejected: Arc<AtomicU64>,
    pub tracks_spawned: Arc<AtomicU64>,
    pub tracks_evicted: Arc<AtomicU64>,
    pub radar_scans: Arc<AtomicU64>,
    pub obstacle_alerts: Arc<AtomicU64>,
    pub classifier_failures: Arc<AtomicU64>,
    pub inference_time_us: Arc<AtomicU64>,
    /// Smoothed frames-per-second, stored as milli-FPS.
    fps_milli: Arc<AtomicU64>,
    last_frame_at: Arc<AtomicU64>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            frames_seen: Arc::new(AtomicU64::new(0)),
            frames_classified: Arc::new(AtomicU64::new(0)),
            frames_skipped_busy: Arc::new(AtomicU64::new(0)),
            detections_accepted: Arc::new(AtomicU64::new(0)),
            detections_rejected: Arc::new(AtomicU64::new(0)),
            tracks_spawned: Arc::new(AtomicU64::new(0)),
            tracks_evicted: Arc::new(AtomicU64::new(0)),
            radar_scans: Arc::new(AtomicU64::new(0)),
            obstacle_alerts: Arc::new(AtomicU64::new(0)),
            classifier_failures: Arc::new(AtomicU64::new(0)),
            inference_time_us: Arc::new(AtomicU64::new(0)),
            fps_milli: Arc::new(AtomicU64::new(0)),
            last_frame_at: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    /// Record a frame arrival at time `now` (seconds) and fold the
    /// instantaneous rate into an exponential moving average.
    pub fn record_frame(&self, now: f64) {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);

        let now_us = (now * 1e6) as u64;
        let prev_us = self.last_frame_at.swap(now_us, Ordering::Relaxed);
        if prev_us > 0 && now_us > prev_us {
            let instantaneous = 1e6 / (now_us - prev_us) as f64;
            let prev_fps = self.fps_milli.load(Ordering::Relaxed) as f64 / 1000.0;
            let smoothed = if prev_fps > 0.0 {
                prev_fps * 0.9 + instantaneous * 0.1
            } else {
                instantaneous
            };
            self.fps_milli
                .store((smoothed * 1000.0) as u64, Ordering::Relaxed);
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps_milli.load(Ordering::Relaxed) as f64 / 1000.0
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            frames_seen: self.frames_seen.load(Ordering::Relaxed),
            frames_classified: self.frames_classified.load(Ordering::Relaxed),
            frames_skipped_busy: self.frames_skipped_busy.load(Ordering::Relaxed),
            detections_accepted: self.detections_accepted.load(Ordering::Relaxed),
            detections_rejected: self.detections_rejected.load(Ordering::Relaxed),
            tracks_spawned: self.tracks_spawned.load(Ordering::Relaxed),
            tracks_evicted: self.tracks_evicted.load(Ordering::Relaxed),
            radar_scans: self.radar_scans.load(Ordering::Relaxed),
            obstacle_alerts: self.obstacle_alerts.load(Ordering::Relaxed),
            classifier_failures: self.classifier_failures.load(Ordering::Relaxed),
            inference_time_us: self.inference_time_us.load(Ordering::Relaxed),
            fps: self.fps(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_seen: u64,
    pub frames_classified: u64,
    pub frames_skipped_busy: u64,
    pub detections_accepted: u64,
    pub detections_rejected: u64,
    pub tracks_spawned: u64,
    pub tracks_evicted: u64,
    pub radar_scans: u64,
    pub obstacle_alerts: u64,
    pub classifier_failures: u64,
    pub inference_time_us: u64,
    pub fps: f64,
}
