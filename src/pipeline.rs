// src/pipeline.rs
//
// Per-frame detection-to-event pipeline: severity for the frame's best
// pothole, debounced event logging, the geofenced upload gate, and the
// overlay data handed to the display surface.

use crate::event_log::EventLogger;
use crate::gps::LocationProvider;
use crate::severity;
use crate::types::{Detection, ObjectClass, OverlayBox, PotholeEvent, SeverityConfig};
use crate::upload::{UploadGate, UploadSink};
use anyhow::Result;
use chrono::{DateTime, Local};

/// Everything one frame produces for its consumers: annotations for the
/// display surface, plus what (if anything) was logged and uploaded.
#[derive(Debug, Clone)]
pub struct FrameSummary {
    pub overlays: Vec<OverlayBox>,
    pub banner: String,
    pub event: Option<PotholeEvent>,
    pub upload_fired: bool,
}

pub struct FramePipeline<S: UploadSink> {
    severity: SeverityConfig,
    logger: EventLogger,
    gate: UploadGate<S>,
    location: LocationProvider,
}

impl<S: UploadSink> FramePipeline<S> {
    pub fn new(
        severity: SeverityConfig,
        logger: EventLogger,
        gate: UploadGate<S>,
        location: LocationProvider,
    ) -> Self {
        Self {
            severity,
            logger,
            gate,
            location,
        }
    }

    /// Runs the event side of the pipeline on one frame's deduplicated
    /// detections.
    pub fn process(
        &mut self,
        detections: &[Detection],
        frame_width: u32,
        frame_height: u32,
        now: DateTime<Local>,
    ) -> Result<FrameSummary> {
        let frame_area = frame_width as i64 * frame_height as i64;

        // NMS output is confidence-sorted, so the first pothole is the
        // highest-confidence one; that is the one an event describes.
        let pothole = detections
            .iter()
            .find(|detection| detection.class == ObjectClass::Pothole)
            .map(|detection| {
                (
                    severity::classify(detection.bbox.area(), frame_area, &self.severity),
                    detection.confidence,
                )
            });

        let fix = self.location.current();
        let event = self.logger.observe(pothole, fix, now)?;
        let upload_fired = self.gate.observe(event.is_some(), fix);

        let overlays = detections
            .iter()
            .map(|detection| OverlayBox {
                bbox: detection.bbox,
                label: match detection.class {
                    ObjectClass::Pothole => {
                        let level =
                            severity::classify(detection.bbox.area(), frame_area, &self.severity);
                        format!("POTHOLE | INT:{}", level.label())
                    }
                    ObjectClass::Obstacle => "OBSTACLE".to_string(),
                },
            })
            .collect();

        Ok(FrameSummary {
            overlays,
            banner: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            event,
            upload_fired,
        })
    }
}
