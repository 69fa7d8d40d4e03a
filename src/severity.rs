// src/severity.rs

use crate::types::{Severity, SeverityConfig};

/// Maps a pothole box's share of the frame to a discrete severity level.
///
/// ratio = 100 * box_area / frame_area; below the medium band -> Low,
/// below the high band -> Medium, otherwise High.
pub fn classify(box_area: i64, frame_area: i64, config: &SeverityConfig) -> Severity {
    // Degenerate frame: nothing to measure against.
    if frame_area <= 0 {
        return Severity::Low;
    }

    let ratio = 100.0 * box_area as f32 / frame_area as f32;

    if ratio < config.medium_ratio_pct {
        Severity::Low
    } else if ratio < config.high_ratio_pct {
        Severity::Medium
    } else {
        Severity::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_AREA: i64 = 100_000;

    fn classify_pct(pct: f32) -> Severity {
        let box_area = (pct / 100.0 * FRAME_AREA as f32) as i64;
        classify(box_area, FRAME_AREA, &SeverityConfig::default())
    }

    #[test]
    fn test_severity_bands_at_boundaries() {
        assert_eq!(classify_pct(0.0), Severity::Low);
        assert_eq!(classify_pct(1.499), Severity::Low);
        assert_eq!(classify_pct(1.5), Severity::Medium);
        assert_eq!(classify_pct(3.999), Severity::Medium);
        assert_eq!(classify_pct(4.0), Severity::High);
        assert_eq!(classify_pct(50.0), Severity::High);
    }

    #[test]
    fn test_zero_frame_area_is_low() {
        assert_eq!(classify(100, 0, &SeverityConfig::default()), Severity::Low);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Severity::Low.label(), "LOW");
        assert_eq!(Severity::Medium.label(), "MEDIUM");
        assert_eq!(Severity::High.label(), "HIGH");
    }
}
