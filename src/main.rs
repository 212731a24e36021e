// src/main.rs

mod config;
mod distance;
mod errors;
mod pipeline;
mod radar;
mod session;
mod sim;
mod tracker;
mod types;

use anyhow::Result;
use pipeline::PerceptionEngine;
use session::{FrameClassifier, Session, SessionReport};
use sim::{SceneClassifier, SceneConfig, SceneFrameSource, SimulatedScene};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use types::{Config, VelocityConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load_or_default("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(cfg.log_filter())
        .init();

    info!("👁  Assisted Navigation Perception Engine Starting");
    info!(
        "Detection: confidence>={:.2}, vision interval={:.2}s | Radar: {}x{} grid every {:.2}s",
        cfg.detection.confidence_threshold,
        cfg.detection.vision_interval_secs,
        cfg.radar.rows,
        cfg.radar.cols,
        cfg.radar.interval_secs
    );
    info!(
        "Tracking: timeout={:.2}s, match distance={:.2}, history={} | Approach threshold={:.2} m/s",
        cfg.tracking.timeout_secs,
        cfg.tracking.match_distance,
        cfg.tracking.history_limit,
        cfg.velocity.approaching_threshold
    );

    // No camera or depth hardware here; run the closed-loop scene where a
    // pedestrian walks toward the user.
    let scene = SimulatedScene::new(SceneConfig::default());
    info!("✓ Simulated scene ready (approaching pedestrian)");

    let classifier = SceneClassifier::new(Arc::clone(&scene))
        .map(|c| Arc::new(c) as Arc<dyn FrameClassifier>);
    let velocity_cfg = cfg.velocity.clone();
    let engine = PerceptionEngine::new(cfg);
    let session = Session::new(engine, classifier, scene);
    info!("✓ Session ready");

    // Bounded run: ~10 seconds of frames at camera rate
    let source = SceneFrameSource::new(300, 30.0);
    let report = session.run(source).await?;

    print_report(&report, &velocity_cfg);
    save_report(&report, Path::new("out"))?;

    Ok(())
}

fn print_report(report: &SessionReport, velocity: &VelocityConfig) {
    let m = &report.metrics;

    info!("\n📊 Final Report:");
    info!(
        "  Frames: {} seen, {} classified, {} skipped (classifier busy)",
        m.frames_seen, m.frames_classified, m.frames_skipped_busy
    );
    info!(
        "  Detections: {} accepted, {} below confidence",
        m.detections_accepted, m.detections_rejected
    );
    info!(
        "  Tracks: {} spawned, {} evicted",
        m.tracks_spawned, m.tracks_evicted
    );
    info!(
        "  Radar: {} scans, {} obstacle alerts",
        m.radar_scans, m.obstacle_alerts
    );
    info!("  Camera rate: {:.1} FPS", m.fps);
    info!("  Last inference: {:.1}ms", m.inference_time_us as f64 / 1000.0);

    if m.classifier_failures > 0 {
        warn!("  ⚠️  Classifier failures: {}", m.classifier_failures);
    }
    if report.detection_degraded {
        warn!("  ⚠️  Detection path was degraded; radar-only session");
    }

    for p in &report.predictions {
        info!(
            "  Tracked: {} | {} [{}]",
            p.label,
            p.semantic_label(velocity),
            p.status_color(velocity).as_str()
        );
    }

    let o = &report.obstacle;
    if o.is_clear() {
        info!("  Path clear at session end");
    } else {
        info!(
            "  Nearest obstacle at session end: {} at {:.1}m [{}]",
            o.label,
            o.distance,
            o.color.as_str()
        );
    }
}

fn save_report(report: &SessionReport, out_dir: &Path) -> Result<()> {
    use std::io::Write;

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join("session_report.json");
    let mut file = std::fs::File::create(&path)?;

    let json = serde_json::json!({
        "metrics": report.metrics,
        "predictions": report.predictions,
        "obstacle": report.obstacle,
        "detection_degraded": report.detection_degraded,
    });
    writeln!(file, "{}", serde_json::to_string_pretty(&json)?)?;
    info!("💾 Session report saved to {}", path.display());
    Ok(())
}
