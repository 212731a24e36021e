// src/types.rs

use serde::{Deserialize, Serialize};

// ============================================================================
// GEOMETRY
// ============================================================================

/// Normalized screen point, [0,1] x [0,1], top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Normalized axis-aligned bounding box, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Intersection-over-Union. 0 = disjoint, 1 = identical.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.w).min(other.x + other.w);
        let y2 = (self.y + self.h).min(other.y + other.h);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter <= 0.0 {
            return 0.0;
        }

        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    /// Distance between box centers in normalized space.
    pub fn center_distance(&self, other: &Rect) -> f32 {
        self.center().distance_to(other.center())
    }
}

// ============================================================================
// DETECTIONS & OUTPUTS
// ============================================================================

/// One classifier output for one frame, before distance estimation.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f32,
    pub rect: Rect,
}

/// A raw detection enriched with a distance estimate. Consumed immediately
/// by the matcher, never retained across frames.
#[derive(Debug, Clone)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub rect: Rect,
    pub distance: f32,
    pub has_valid_distance: bool,
}

/// UI color hint for an alert or prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusColor {
    Red,
    Yellow,
    Green,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::Green => "GREEN",
        }
    }
}

/// Per-object output snapshot, derived read-only from a tracked object.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub label: String,
    pub rect: Rect,
    pub velocity: f32,
    pub is_approaching: bool,
}

impl Prediction {
    /// Spoken-friendly motion summary. Sign convention: negative velocity
    /// means the object is getting closer.
    pub fn semantic_label(&self, velocity: &VelocityConfig) -> String {
        if self.is_approaching {
            format!("APPROACHING! {:.1} m/s", self.velocity.abs())
        } else if self.velocity > velocity.receding_threshold {
            format!("Moving Away {:.1} m/s", self.velocity.abs())
        } else {
            "Stationary".to_string()
        }
    }

    pub fn status_color(&self, velocity: &VelocityConfig) -> StatusColor {
        if self.is_approaching {
            StatusColor::Red
        } else if self.velocity > velocity.receding_threshold {
            StatusColor::Green
        } else {
            StatusColor::Yellow
        }
    }
}

/// The single "nearest thing in front of me" alert. `distance == 0.0`
/// means nothing within range.
#[derive(Debug, Clone, Serialize)]
pub struct ObstacleSummary {
    pub label: String,
    pub distance: f32,
    pub screen_point: Option<Point>,
    pub is_approaching: bool,
    pub color: StatusColor,
}

impl ObstacleSummary {
    pub fn clear() -> Self {
        Self {
            label: String::new(),
            distance: 0.0,
            screen_point: None,
            is_approaching: false,
            color: StatusColor::Yellow,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.distance == 0.0
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub distance: DistanceConfig,
    pub tracking: TrackingConfig,
    pub velocity: VelocityConfig,
    pub radar: RadarConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detections below this confidence never enter the pipeline.
    pub confidence_threshold: f32,
    /// Minimum spacing between classifier dispatches (caps vision at 10 FPS).
    pub vision_interval_secs: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            vision_interval_secs: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Obstacles beyond this range are ignored (meters).
    pub max_distance: f32,
    /// Probe hits at or below this range are discarded as sensor noise.
    pub min_distance: f32,
    /// Radar ignores returns closer than this (the user's own body).
    pub safe_distance: f32,
    /// Corner probe inset as a fraction of box size.
    pub corner_offset: f32,
    /// Gain for the area-inverse fallback estimate when all probes fail.
    pub area_gain: f32,
    pub area_epsilon: f32,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            max_distance: 5.0,
            min_distance: 0.1,
            safe_distance: 0.2,
            corner_offset: 0.2,
            area_gain: 0.18,
            area_epsilon: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Tracks not updated for this long are evicted (seconds).
    pub timeout_secs: f64,
    /// Max normalized center distance for the fallback match.
    pub match_distance: f32,
    /// Minimum IoU for the primary match.
    pub min_iou: f32,
    /// Distance history entries kept per track, oldest evicted first.
    pub history_limit: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0.5,
            match_distance: 0.2,
            min_iou: 0.1,
            history_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Velocity below this (m/s, negative = closing) flags approach.
    pub approaching_threshold: f32,
    /// Velocity above this flags a receding object.
    pub receding_threshold: f32,
    /// Exponential moving average weights: new = old * a + raw * b.
    pub smoothing_old: f32,
    pub smoothing_new: f32,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            approaching_threshold: -0.1,
            receding_threshold: 0.3,
            smoothing_old: 0.6,
            smoothing_new: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Minimum spacing between area scans (caps radar at ~6.7 Hz).
    pub interval_secs: f64,
    pub rows: usize,
    pub cols: usize,
    /// Scanned region, biased toward the lower-center field of view.
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0.15,
            rows: 3,
            cols: 3,
            min_x: 0.2,
            max_x: 0.8,
            min_y: 0.25,
            max_y: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
