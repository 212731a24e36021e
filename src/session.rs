// src/session.rs
//
// Real-time adapter around the perception engine. Frames arrive from a
// blocking sensor loop, classifier runs are offloaded to the blocking
// pool, and every result marshals back through one channel into the one
// task that owns the engine. Track mutation therefore never races the
// radar timer, which ticks on the same task.

use crate::distance::DepthProbe;
use crate::errors::PerceptionError;
use crate::pipeline::{InferenceGate, MetricsSummary, PerceptionEngine};
use crate::types::{ObstacleSummary, Prediction, RawDetection};
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Opaque camera frame reference. The engine never looks inside; only the
/// classifier boundary does.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    pub id: u64,
    pub timestamp: f64,
}

/// Boundary to the object classifier. `classify` is long-running relative
/// to frame arrival and is always invoked off the engine task.
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, frame: &FrameHandle) -> Result<Vec<RawDetection>, PerceptionError>;
}

/// Boundary to the camera. Yields frames at sensor rate from a blocking
/// loop; `None` ends the session.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Option<FrameHandle>;
}

enum SessionEvent {
    Frame(FrameHandle),
    DetectionsReady {
        dispatched_at: f64,
        result: Result<Vec<RawDetection>, PerceptionError>,
    },
    EndOfStream,
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub metrics: MetricsSummary,
    pub predictions: Vec<Prediction>,
    pub obstacle: ObstacleSummary,
    pub detection_degraded: bool,
}

pub struct Session {
    engine: PerceptionEngine,
    gate: InferenceGate,
    classifier: Option<Arc<dyn FrameClassifier>>,
    probe: Arc<dyn DepthProbe + Send + Sync>,
}

impl Session {
    /// A classifier that failed to initialize is a detection-path-only
    /// fault: the session still runs, radar-only, and the failure is
    /// reported exactly once.
    pub fn new(
        engine: PerceptionEngine,
        classifier: Result<Arc<dyn FrameClassifier>, PerceptionError>,
        probe: Arc<dyn DepthProbe + Send + Sync>,
    ) -> Self {
        let mut engine = engine;
        let gate = InferenceGate::new(engine.config().detection.vision_interval_secs);
        let classifier = match classifier {
            Ok(c) => Some(c),
            Err(e) => {
                engine.enter_degraded_mode(&e);
                None
            }
        };
        Self {
            engine,
            gate,
            classifier,
            probe,
        }
    }

    pub async fn run<S: FrameSource + 'static>(mut self, mut source: S) -> Result<SessionReport> {
        let (tx, mut rx) = mpsc::channel::<SessionEvent>(32);

        // Arrival loop. Runs on the blocking pool at sensor pace and only
        // ever hands frames across the channel.
        let pump_tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            while let Some(frame) = source.next_frame() {
                if pump_tx.blocking_send(SessionEvent::Frame(frame)).is_err() {
                    return;
                }
            }
            let _ = pump_tx.blocking_send(SessionEvent::EndOfStream);
        });

        let started = Instant::now();
        let mut radar = tokio::time::interval(Duration::from_secs_f64(
            self.engine.config().radar.interval_secs,
        ));
        radar.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ended = false;
        while !ended {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(SessionEvent::Frame(frame)) => {
                        self.on_frame(frame, &tx, started);
                    }
                    Some(SessionEvent::DetectionsReady { dispatched_at, result }) => {
                        self.on_detections(dispatched_at, result, started);
                    }
                    Some(SessionEvent::EndOfStream) | None => ended = true,
                },
                _ = radar.tick() => {
                    let now = started.elapsed().as_secs_f64();
                    if let Some(summary) = self.engine.radar_tick(self.probe.as_ref(), now) {
                        if !summary.is_clear() {
                            info!(
                                "nearest obstacle: {} at {:.1}m [{}]",
                                summary.label,
                                summary.distance,
                                summary.color.as_str()
                            );
                        }
                    }
                }
            }
        }

        // One inference may still be in flight; let it rejoin so its
        // detections are not silently dropped.
        drop(tx);
        while self.gate.is_busy() {
            match rx.recv().await {
                Some(SessionEvent::DetectionsReady { dispatched_at, result }) => {
                    self.on_detections(dispatched_at, result, started);
                }
                Some(_) => {}
                None => break,
            }
        }

        Ok(SessionReport {
            metrics: self.engine.metrics().summary(),
            predictions: self.engine.predictions(),
            obstacle: self.engine.obstacle(),
            detection_degraded: self.engine.health().detection_degraded,
        })
    }

    fn on_frame(&mut self, frame: FrameHandle, tx: &mpsc::Sender<SessionEvent>, started: Instant) {
        let now = started.elapsed().as_secs_f64();
        self.engine.metrics().record_frame(now);

        let Some(classifier) = &self.classifier else {
            return;
        };

        if self.gate.try_dispatch(now) {
            let classifier = Arc::clone(classifier);
            let tx = tx.clone();
            tokio::task::spawn_blocking(move || {
                let result = classifier.classify(&frame);
                let _ = tx.blocking_send(SessionEvent::DetectionsReady {
                    dispatched_at: now,
                    result,
                });
            });
        } else {
            self.engine
                .metrics()
                .inc(&self.engine.metrics().frames_skipped_busy);
        }
    }

    fn on_detections(
        &mut self,
        dispatched_at: f64,
        result: Result<Vec<RawDetection>, PerceptionError>,
        started: Instant,
    ) {
        self.gate.complete();
        let now = started.elapsed().as_secs_f64();
        let metrics = self.engine.metrics();
        metrics.set_timing(
            &metrics.inference_time_us,
            ((now - dispatched_at) * 1e6) as u64,
        );

        match result {
            Ok(raw) => self.engine.process_detections(raw, self.probe.as_ref(), now),
            Err(err) => self.engine.record_classifier_failure(&err),
        }
    }
}
