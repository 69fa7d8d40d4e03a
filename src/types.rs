// src/types.rs

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub detection: DetectionConfig,
    pub severity: SeverityConfig,
    pub gps: GpsConfig,
    pub upload: UploadConfig,
    pub camera: CameraConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub input_size: usize,
    pub num_classes: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "best_dynamic_int8.onnx".to_string(),
            input_size: 640,
            num_classes: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.4,
            nms_threshold: 0.45,
        }
    }
}

/// Pothole severity bands as percent of frame area covered by the box.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    pub medium_ratio_pct: f32,
    pub high_ratio_pct: f32,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            medium_ratio_pct: 1.5,
            high_ratio_pct: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub device: String,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyAMA0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub target_latitude: f64,
    pub target_longitude: f64,
    pub radius_meters: f64,
    pub command: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            target_latitude: 12.971598,
            target_longitude: 77.594566,
            radius_meters: 100.0,
            command: "python3 upload_script.py".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: i32,
    pub window_title: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            window_title: "Road Anomaly Detection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub event_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            event_log: "pothole_detection.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Obstacle,
    Pothole,
}

impl ObjectClass {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ObjectClass::Obstacle),
            1 => Some(ObjectClass::Pothole),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObjectClass::Obstacle => "obstacle",
            ObjectClass::Pothole => "pothole",
        }
    }
}

/// Corner-form box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn x2(&self) -> i32 {
        self.x + self.width
    }

    pub fn y2(&self) -> i32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone)]
pub struct Detection {
    pub class: ObjectClass,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

/// Latest GPS reading. `NoFix` covers both "never had a fix" and
/// "receiver lost the fix and nothing better arrived since".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpsFix {
    NoFix,
    Fix { latitude: f64, longitude: f64 },
}

impl GpsFix {
    pub fn is_valid(&self) -> bool {
        matches!(self, GpsFix::Fix { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PotholeEvent {
    pub timestamp: DateTime<Local>,
    pub fix: GpsFix,
    pub severity: Severity,
    pub confidence: f32,
}

/// One annotation rectangle for the display surface.
#[derive(Debug, Clone)]
pub struct OverlayBox {
    pub bbox: BoundingBox,
    pub label: String,
}
