// src/postprocess.rs
//
// Decodes raw model output into class-labeled boxes in source-image
// coordinates, then deduplicates with greedy non-max suppression.

use crate::types::{BoundingBox, Detection, ObjectClass};
use tracing::debug;

pub struct Postprocessor {
    confidence_threshold: f32,
    nms_threshold: f32,
    input_size: f32,
}

impl Postprocessor {
    pub fn new(confidence_threshold: f32, nms_threshold: f32, input_size: usize) -> Self {
        Self {
            confidence_threshold,
            nms_threshold,
            input_size: input_size as f32,
        }
    }

    /// Full postprocessing pass: decode + NMS.
    ///
    /// `candidates` is row-major, one candidate per `stride` floats:
    /// 4 center-form box parameters followed by per-class scores.
    pub fn run(
        &self,
        candidates: &[f32],
        stride: usize,
        frame_width: u32,
        frame_height: u32,
    ) -> Vec<Detection> {
        let decoded = self.decode(candidates, stride, frame_width, frame_height);
        let kept = self.nms(decoded);
        debug!("Postprocess kept {} detections", kept.len());
        kept
    }

    /// Per-candidate: argmax class, strict confidence filter, and
    /// center-form model-space box -> corner-form source pixels.
    pub fn decode(
        &self,
        candidates: &[f32],
        stride: usize,
        frame_width: u32,
        frame_height: u32,
    ) -> Vec<Detection> {
        let mut detections = Vec::new();
        if stride < 5 {
            return detections;
        }

        let w0 = frame_width as f32;
        let h0 = frame_height as f32;

        for row in candidates.chunks_exact(stride) {
            let scores = &row[4..];

            let mut best_index = 0;
            let mut best_score = scores[0];
            for (index, &score) in scores.iter().enumerate().skip(1) {
                if score > best_score {
                    best_score = score;
                    best_index = index;
                }
            }

            // Strict comparison: a score exactly at the threshold is rejected.
            if best_score <= self.confidence_threshold {
                continue;
            }

            let class = match ObjectClass::from_index(best_index) {
                Some(class) => class,
                None => {
                    debug!("Skipping candidate with unknown class index {}", best_index);
                    continue;
                }
            };

            debug!("Candidate {} at {:.2}", class.name(), best_score);

            let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);

            // The model works at a fixed input resolution; boxes are
            // stretch-scaled back to the source frame.
            let x1 = ((cx - w / 2.0) * w0 / self.input_size) as i32;
            let y1 = ((cy - h / 2.0) * h0 / self.input_size) as i32;
            let box_w = (w * w0 / self.input_size) as i32;
            let box_h = (h * h0 / self.input_size) as i32;

            detections.push(Detection {
                class,
                confidence: best_score,
                bbox: BoundingBox {
                    x: x1,
                    y: y1,
                    width: box_w,
                    height: box_h,
                },
            });
        }

        detections
    }

    /// Class-agnostic greedy NMS: accept the highest-confidence box,
    /// drop everything overlapping it beyond the IoU threshold, repeat.
    pub fn nms(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        if detections.is_empty() {
            return detections;
        }

        detections.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut keep = Vec::new();

        while !detections.is_empty() {
            let current = detections.remove(0);

            detections.retain(|candidate| iou(&current.bbox, &candidate.bbox) <= self.nms_threshold);
            keep.push(current);
        }

        keep
    }
}

/// Intersection-over-union of two corner-form boxes.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x) as f32;
    let y1 = a.y.max(b.y) as f32;
    let x2 = a.x2().min(b.x2()) as f32;
    let y2 = a.y2().min(b.y2()) as f32;

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() as f32 + b.area() as f32 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postprocessor() -> Postprocessor {
        Postprocessor::new(0.4, 0.45, 640)
    }

    // One candidate row: cx, cy, w, h in 640-space + 2 class scores.
    fn row(cx: f32, cy: f32, w: f32, h: f32, obstacle: f32, pothole: f32) -> Vec<f32> {
        vec![cx, cy, w, h, obstacle, pothole]
    }

    #[test]
    fn test_empty_output_yields_no_detections() {
        let detections = postprocessor().run(&[], 6, 1280, 720);
        assert!(detections.is_empty());
    }

    #[test]
    fn test_confidence_threshold_is_strict() {
        let pp = postprocessor();

        let at_threshold = row(320.0, 320.0, 64.0, 64.0, 0.0, 0.4);
        assert!(pp.decode(&at_threshold, 6, 640, 640).is_empty());

        let above_threshold = row(320.0, 320.0, 64.0, 64.0, 0.0, 0.41);
        let detections = pp.decode(&above_threshold, 6, 640, 640);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class, ObjectClass::Pothole);
    }

    #[test]
    fn test_argmax_selects_best_class() {
        let detections = postprocessor().decode(&row(320.0, 320.0, 64.0, 64.0, 0.9, 0.5), 6, 640, 640);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class, ObjectClass::Obstacle);
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_box_scaled_to_source_frame() {
        // Centered 64x64 box in 640-space on a 1280x720 frame:
        // x scales by 2, y by 720/640.
        let detections = postprocessor().decode(&row(320.0, 320.0, 64.0, 64.0, 0.0, 0.8), 6, 1280, 720);
        let bbox = detections[0].bbox;
        assert_eq!(bbox.x, (288.0f32 * 2.0) as i32);
        assert_eq!(bbox.y, (288.0f32 * 720.0 / 640.0) as i32);
        assert_eq!(bbox.width, 128);
        assert_eq!(bbox.height, (64.0f32 * 720.0 / 640.0) as i32);
    }

    #[test]
    fn test_nms_suppresses_overlapping_lower_confidence() {
        let pp = postprocessor();
        let mut candidates = row(320.0, 320.0, 100.0, 100.0, 0.0, 0.9);
        // Nearly identical box, lower confidence
        candidates.extend(row(324.0, 324.0, 100.0, 100.0, 0.0, 0.6));
        // Far-away box survives
        candidates.extend(row(100.0, 100.0, 50.0, 50.0, 0.0, 0.7));

        let detections = pp.run(&candidates, 6, 640, 640);
        assert_eq!(detections.len(), 2);
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
        assert!((detections[1].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_nms_is_idempotent() {
        let pp = postprocessor();
        let mut candidates = row(320.0, 320.0, 100.0, 100.0, 0.0, 0.9);
        candidates.extend(row(330.0, 330.0, 100.0, 100.0, 0.0, 0.8));
        candidates.extend(row(100.0, 100.0, 50.0, 50.0, 0.0, 0.7));
        candidates.extend(row(500.0, 200.0, 40.0, 80.0, 0.6, 0.0));

        let first_pass = pp.run(&candidates, 6, 640, 640);
        let second_pass = pp.nms(first_pass.clone());

        assert_eq!(first_pass.len(), second_pass.len());
        for (a, b) in first_pass.iter().zip(second_pass.iter()) {
            assert_eq!(a.bbox, b.bbox);
            assert_eq!(a.class, b.class);
        }
    }

    #[test]
    fn test_iou_disjoint_and_identical() {
        let a = BoundingBox {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        let b = BoundingBox {
            x: 100,
            y: 100,
            width: 10,
            height: 10,
        };
        assert_eq!(iou(&a, &b), 0.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }
}
