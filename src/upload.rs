// src/upload.rs
//
// One-shot upload trigger gated by a circular geofence. The latch fires
// at most once per zone visit; leaving the zone (confirmed by a valid
// fix) re-arms it.

use crate::geofence::within_radius;
use crate::types::{GpsFix, UploadConfig};
use anyhow::Result;
use std::process::Command;
use tracing::{info, warn};

/// Injected upload capability so the gate never shells out in tests.
pub trait UploadSink {
    fn trigger(&mut self) -> Result<()>;
}

/// Production sink: spawns the configured external command and does not
/// wait for it. Exit status is intentionally unobserved; a failed upload
/// is only visible as its absence of effect.
pub struct ScriptUploadSink {
    command: String,
}

impl ScriptUploadSink {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl UploadSink for ScriptUploadSink {
    fn trigger(&mut self) -> Result<()> {
        info!("Running upload command: {}", self.command);
        Command::new("sh").arg("-c").arg(&self.command).spawn()?;
        Ok(())
    }
}

pub struct UploadGate<S: UploadSink> {
    sink: S,
    target_latitude: f64,
    target_longitude: f64,
    radius_meters: f64,
    triggered: bool,
}

impl<S: UploadSink> UploadGate<S> {
    pub fn new(sink: S, config: &UploadConfig) -> Self {
        Self {
            sink,
            target_latitude: config.target_latitude,
            target_longitude: config.target_longitude,
            radius_meters: config.radius_meters,
            triggered: false,
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Called once per frame. `event_logged` is true only on frames
    /// where the event logger actually fired.
    ///
    /// Evaluation order matters: the trigger check runs first, then the
    /// zone-exit reset. A frame without a fix changes nothing — a fix
    /// outage inside the zone must not re-arm the latch.
    ///
    /// Returns true when the upload action fired this frame.
    pub fn observe(&mut self, event_logged: bool, fix: GpsFix) -> bool {
        let mut fired = false;

        if event_logged && !self.triggered {
            if let GpsFix::Fix {
                latitude,
                longitude,
            } = fix
            {
                if within_radius(
                    latitude,
                    longitude,
                    self.target_latitude,
                    self.target_longitude,
                    self.radius_meters,
                ) {
                    info!("📡 Upload zone reached. Running upload script...");
                    if let Err(error) = self.sink.trigger() {
                        warn!("Upload invocation failed: {}", error);
                    }
                    self.triggered = true;
                    fired = true;
                }
            }
        }

        if let GpsFix::Fix {
            latitude,
            longitude,
        } = fix
        {
            if !within_radius(
                latitude,
                longitude,
                self.target_latitude,
                self.target_longitude,
                self.radius_meters,
            ) {
                self.triggered = false;
            }
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FakeSink {
        calls: Rc<RefCell<u32>>,
        fail: bool,
    }

    impl UploadSink for FakeSink {
        fn trigger(&mut self) -> Result<()> {
            *self.calls.borrow_mut() += 1;
            if self.fail {
                anyhow::bail!("sink failure");
            }
            Ok(())
        }
    }

    fn gate_with_sink(fail: bool) -> (UploadGate<FakeSink>, Rc<RefCell<u32>>) {
        let calls = Rc::new(RefCell::new(0));
        let sink = FakeSink {
            calls: Rc::clone(&calls),
            fail,
        };
        let config = UploadConfig {
            target_latitude: 12.971598,
            target_longitude: 77.594566,
            radius_meters: 100.0,
            command: String::new(),
        };
        (UploadGate::new(sink, &config), calls)
    }

    fn inside() -> GpsFix {
        GpsFix::Fix {
            latitude: 12.971598,
            longitude: 77.594566,
        }
    }

    fn outside() -> GpsFix {
        // ~1 degree of latitude away, far outside a 100 m radius
        GpsFix::Fix {
            latitude: 13.971598,
            longitude: 77.594566,
        }
    }

    #[test]
    fn test_fires_once_per_zone_visit() {
        let (mut gate, calls) = gate_with_sink(false);

        // [outside, inside+logged, inside+logged, outside, inside+logged]
        assert!(!gate.observe(false, outside()));
        assert!(gate.observe(true, inside()));
        assert!(!gate.observe(true, inside()));
        assert!(!gate.observe(false, outside()));
        assert!(gate.observe(true, inside()));

        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_fix_loss_preserves_latch() {
        let (mut gate, calls) = gate_with_sink(false);

        assert!(gate.observe(true, inside()));
        assert!(!gate.observe(false, GpsFix::NoFix));
        assert!(!gate.observe(false, GpsFix::NoFix));
        // Back inside, still the same zone visit: no retrigger
        assert!(!gate.observe(true, inside()));

        assert_eq!(*calls.borrow(), 1);
        assert!(gate.is_triggered());
    }

    #[test]
    fn test_no_trigger_without_logged_event() {
        let (mut gate, calls) = gate_with_sink(false);

        assert!(!gate.observe(false, inside()));
        assert!(!gate.observe(false, inside()));

        assert_eq!(*calls.borrow(), 0);
        assert!(!gate.is_triggered());
    }

    #[test]
    fn test_no_trigger_outside_zone_or_without_fix() {
        let (mut gate, calls) = gate_with_sink(false);

        assert!(!gate.observe(true, outside()));
        assert!(!gate.observe(true, GpsFix::NoFix));

        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_sink_failure_still_latches() {
        // Fire-and-forget: a failing upload is logged, not retried.
        let (mut gate, calls) = gate_with_sink(true);

        assert!(gate.observe(true, inside()));
        assert!(gate.is_triggered());
        assert!(!gate.observe(true, inside()));

        assert_eq!(*calls.borrow(), 1);
    }
}
