// src/event_log.rs
//
// Edge-triggered pothole event logging. One event is appended per
// contiguous run of frames containing a pothole; the latch clears as
// soon as a frame arrives with no pothole in it.

use crate::types::{GpsFix, PotholeEvent, Severity};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const SEPARATOR: &str = "---------------------------------";

pub struct EventLogger {
    path: PathBuf,
    pothole_logged: bool,
}

impl EventLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pothole_logged: false,
        }
    }

    /// Called once per frame. `pothole` carries the severity and
    /// confidence of the frame's pothole detection, if any.
    ///
    /// Returns the event when this frame actually logged one, i.e. on
    /// the no-pothole -> pothole transition only.
    pub fn observe(
        &mut self,
        pothole: Option<(Severity, f32)>,
        fix: GpsFix,
        now: DateTime<Local>,
    ) -> Result<Option<PotholeEvent>> {
        let (severity, confidence) = match pothole {
            Some(pothole) => pothole,
            None => {
                self.pothole_logged = false;
                return Ok(None);
            }
        };

        if self.pothole_logged {
            return Ok(None);
        }

        let event = PotholeEvent {
            timestamp: now,
            fix,
            severity,
            confidence,
        };

        self.append(&event)?;
        self.pothole_logged = true;

        match fix {
            GpsFix::Fix {
                latitude,
                longitude,
            } => info!("📍 Pothole logged → {}, {}", latitude, longitude),
            GpsFix::NoFix => info!("📍 Pothole logged → No Fix"),
        }

        Ok(Some(event))
    }

    /// The whole block is written with a single call so a crash cannot
    /// interleave two events; durability beyond that is best-effort.
    fn append(&self, event: &PotholeEvent) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open event log {}", self.path.display()))?;

        file.write_all(format_block(event).as_bytes())
            .with_context(|| format!("Failed to append to event log {}", self.path.display()))?;

        Ok(())
    }
}

/// Renders one event in the fixed text-block format the log consumers
/// expect. The map link line only appears with a valid fix.
pub fn format_block(event: &PotholeEvent) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "Timestamp: {}\n",
        event.timestamp.format("%Y-%m-%d %H:%M:%S%.6f")
    ));

    match event.fix {
        GpsFix::Fix {
            latitude,
            longitude,
        } => {
            block.push_str(&format!("Latitude: {}\n", latitude));
            block.push_str(&format!("Longitude: {}\n", longitude));
            block.push_str(&format!("Severity: {}\n", event.severity.label()));
            block.push_str(&format!("Confidence: {:.2}\n", event.confidence));
            block.push_str(&format!(
                "Google Maps: https://www.google.com/maps?q={},{}\n",
                latitude, longitude
            ));
        }
        GpsFix::NoFix => {
            block.push_str("Latitude: No Fix\n");
            block.push_str("Longitude: No Fix\n");
            block.push_str(&format!("Severity: {}\n", event.severity.label()));
            block.push_str(&format!("Confidence: {:.2}\n", event.confidence));
        }
    }

    block.push_str(SEPARATOR);
    block.push('\n');
    block
}
