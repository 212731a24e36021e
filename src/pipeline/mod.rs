// src/pipeline/mod.rs
//
// Single-owner coordinator for the perception state. All mutation of the
// track store happens through this type on one task; everything exposed
// outward is a pull-based snapshot.

pub mod gate;
pub mod metrics;

pub use gate::InferenceGate;
pub use metrics::{MetricsSummary, PipelineMetrics};

use crate::distance::{DepthProbe, DistanceMeasurer};
use crate::errors::PerceptionError;
use crate::radar::RadarScanner;
use crate::tracker::ObjectTracker;
use crate::types::{Config, Detection, ObstacleSummary, Prediction, RawDetection};
use tracing::{info, warn};

/// Non-fatal condition the caller may want to surface to the user.
#[derive(Debug, Clone, Default)]
pub struct EngineHealth {
    /// Detection path is down; radar-only operation.
    pub detection_degraded: bool,
    /// Transient advisory, clears automatically on recovery.
    pub advisory: Option<String>,
}

pub struct PerceptionEngine {
    config: Config,
    measurer: DistanceMeasurer,
    tracker: ObjectTracker,
    radar: RadarScanner,
    metrics: PipelineMetrics,
    health: EngineHealth,
}

impl PerceptionEngine {
    pub fn new(config: Config) -> Self {
        let measurer = DistanceMeasurer::new(config.distance.clone());
        let tracker = ObjectTracker::new(config.tracking.clone(), config.velocity.clone());
        let radar = RadarScanner::new(
            config.radar.clone(),
            config.distance.clone(),
            config.tracking.clone(),
            config.velocity.clone(),
        );
        Self {
            config,
            measurer,
            tracker,
            radar,
            metrics: PipelineMetrics::new(),
            health: EngineHealth::default(),
        }
    }

    /// Ingest one classifier batch: confidence-filter, estimate distance
    /// per detection, then run the matcher. Probe failures inside are
    /// absorbed as "no data this round".
    pub fn process_detections(
        &mut self,
        raw: Vec<RawDetection>,
        probe: &dyn DepthProbe,
        now: f64,
    ) {
        let threshold = self.config.detection.confidence_threshold;
        let mut detections = Vec::with_capacity(raw.len());
        for r in raw {
            if r.confidence < threshold {
                self.metrics.inc(&self.metrics.detections_rejected);
                continue;
            }
            let sample = self.measurer.measure(r.rect, probe);
            detections.push(Detection {
                label: r.label,
                confidence: r.confidence,
                rect: r.rect,
                distance: sample.meters,
                has_valid_distance: sample.valid,
            });
        }

        self.metrics
            .add(&self.metrics.detections_accepted, detections.len() as u64);
        self.metrics.inc(&self.metrics.frames_classified);
        let stats = self.tracker.update(&detections, now);
        self.metrics
            .add(&self.metrics.tracks_spawned, stats.spawned as u64);
        self.metrics
            .add(&self.metrics.tracks_evicted, stats.evicted as u64);

        // A successful classifier round clears any transient advisory
        if self.health.advisory.is_some() {
            info!("session recovered, clearing advisory");
            self.health.advisory = None;
        }
    }

    /// Drive the radar path. Returns the fresh summary when a scan ran.
    pub fn radar_tick(&mut self, probe: &dyn DepthProbe, now: f64) -> Option<ObstacleSummary> {
        let summary = self.radar.scan(probe, self.tracker.tracks(), now)?;
        self.metrics.inc(&self.metrics.radar_scans);
        if !summary.is_clear() {
            self.metrics.inc(&self.metrics.obstacle_alerts);
        }
        Some(summary)
    }

    /// Current per-object prediction list. Objects whose latest distance
    /// estimate is beyond the usable range are withheld from the UI.
    pub fn predictions(&self) -> Vec<Prediction> {
        let max = self.config.distance.max_distance;
        self.tracker
            .tracks()
            .iter()
            .filter(|t| t.latest_distance().map_or(false, |d| d < max))
            .map(|t| Prediction {
                label: t.label.clone(),
                rect: t.rect,
                velocity: t.velocity,
                is_approaching: t.is_approaching(&self.config.velocity),
            })
            .collect()
    }

    /// Latest nearest-obstacle alert (always-current, may be clear).
    pub fn obstacle(&self) -> ObstacleSummary {
        self.radar.current().clone()
    }

    /// Classifier failed after init. Logged and counted; the detection
    /// path simply contributes nothing this round.
    pub fn record_classifier_failure(&mut self, err: &PerceptionError) {
        self.metrics.inc(&self.metrics.classifier_failures);
        warn!("classifier round failed: {}", err);
    }

    /// Classifier never came up. Reported once; radar keeps running.
    pub fn enter_degraded_mode(&mut self, err: &PerceptionError) {
        if !self.health.detection_degraded {
            warn!("detection path disabled, running radar only: {}", err);
            self.health.detection_degraded = true;
        }
    }

    /// Transient session interruption. Tracked state is deliberately left
    /// intact; staleness eviction will deal with it if the gap is long.
    pub fn note_interruption(&mut self, reason: &str) {
        warn!("session interrupted: {}", reason);
        self.health.advisory = Some(reason.to_string());
    }

    pub fn health(&self) -> &EngineHealth {
        &self.health
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn track_count(&self) -> usize {
        self.tracker.tracks().len()
    }
}
