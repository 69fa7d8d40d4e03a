// src/gps.rs
//
// Background GPS reader. A daemon thread consumes NMEA sentences from
// the receiver's serial device and publishes the most recent valid fix;
// the frame loop only ever takes cheap snapshots of that shared state.

use crate::types::GpsFix;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, info, warn};

/// A parsed `$GPGGA` sentence. `quality` 0 means the receiver reported
/// no fix; the provider ignores such sentences but the parser keeps the
/// distinction so a parse error is never conflated with "no fix".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GgaFix {
    pub latitude: f64,
    pub longitude: f64,
    pub quality: u32,
}

/// Parses the coordinate and fix-quality fields of a GGA sentence.
/// Any malformed or incomplete sentence yields `None`.
pub fn parse_gga(sentence: &str) -> Option<GgaFix> {
    let fields: Vec<&str> = sentence.trim_end().split(',').collect();
    // $xxGGA,time,lat,N/S,lon,E/W,quality,...
    if fields.len() < 7 {
        return None;
    }

    let latitude = parse_coordinate(fields[2], fields[3], 2)?;
    let longitude = parse_coordinate(fields[4], fields[5], 3)?;
    let quality: u32 = fields[6].parse().ok()?;

    Some(GgaFix {
        latitude,
        longitude,
        quality,
    })
}

/// NMEA packs coordinates as (d)ddmm.mmmm with a separate hemisphere
/// letter; `degree_digits` is 2 for latitude, 3 for longitude.
fn parse_coordinate(value: &str, hemisphere: &str, degree_digits: usize) -> Option<f64> {
    if !value.is_ascii() || value.len() < degree_digits + 2 {
        return None;
    }

    let degrees: f64 = value[..degree_digits].parse().ok()?;
    let minutes: f64 = value[degree_digits..].parse().ok()?;
    if !(0.0..60.0).contains(&minutes) {
        return None;
    }

    let decimal = degrees + minutes / 60.0;

    match hemisphere {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

/// Shared last-known-fix snapshot, written by the reader thread and
/// read by the frame loop.
#[derive(Clone)]
pub struct LocationProvider {
    latest: Arc<Mutex<GpsFix>>,
}

impl LocationProvider {
    pub fn new() -> Self {
        Self {
            latest: Arc::new(Mutex::new(GpsFix::NoFix)),
        }
    }

    pub fn current(&self) -> GpsFix {
        *self.latest.lock().expect("gps fix lock poisoned")
    }

    pub fn publish(&self, fix: GpsFix) {
        *self.latest.lock().expect("gps fix lock poisoned") = fix;
    }

    /// Feeds one raw line from the receiver. Only GGA sentences with a
    /// positive fix quality update the snapshot; everything else
    /// (other sentence types, parse failures, quality 0) keeps the
    /// last-known value.
    pub fn consume_line(&self, line: &str) {
        if !line.starts_with("$GPGGA") && !line.starts_with("$GNGGA") {
            return;
        }

        match parse_gga(line) {
            Some(gga) if gga.quality > 0 => {
                self.publish(GpsFix::Fix {
                    latitude: gga.latitude,
                    longitude: gga.longitude,
                });
            }
            Some(gga) => {
                debug!("GGA sentence with fix quality {}, ignored", gga.quality);
            }
            None => {
                debug!("Malformed GGA sentence, ignored");
            }
        }
    }

    /// Spawns the reader thread on the given serial device path. Failure
    /// to open the device is not fatal: the provider simply stays at
    /// NoFix, matching the rest of the sensor error policy.
    pub fn spawn_reader(&self, device: &str) {
        let provider = self.clone();
        let device = device.to_string();

        thread::spawn(move || {
            let file = match File::open(&device) {
                Ok(file) => file,
                Err(error) => {
                    warn!("GPS device {} unavailable: {}", device, error);
                    return;
                }
            };

            info!("📡 GPS reader started on {}", device);
            let reader = BufReader::new(file);

            for line in reader.lines() {
                match line {
                    Ok(line) => provider.consume_line(&line),
                    Err(_) => continue,
                }
            }

            warn!("GPS stream on {} ended", device);
        });
    }
}

impl Default for LocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

    #[test]
    fn test_parse_valid_gga() {
        let gga = parse_gga(VALID_GGA).unwrap();
        assert!((gga.latitude - 48.1173).abs() < 1e-4);
        assert!((gga.longitude - 11.516_667).abs() < 1e-4);
        assert_eq!(gga.quality, 1);
    }

    #[test]
    fn test_parse_southern_western_hemispheres() {
        let gga =
            parse_gga("$GPGGA,123519,3356.123,S,15112.456,W,2,08,0.9,12.0,M,46.9,M,,*47").unwrap();
        assert!(gga.latitude < 0.0);
        assert!(gga.longitude < 0.0);
        assert!((gga.latitude + (33.0 + 56.123 / 60.0)).abs() < 1e-6);
        assert!((gga.longitude + (151.0 + 12.456 / 60.0)).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_gga("$GPGGA,123519"), None);
        assert_eq!(parse_gga("$GPGGA,123519,garbage,N,01131.000,E,1,08"), None);
        assert_eq!(parse_gga("$GPGGA,123519,4807.038,X,01131.000,E,1,08"), None);
        assert_eq!(parse_gga(""), None);
    }

    #[test]
    fn test_parse_keeps_quality_zero_distinct() {
        // Well-formed sentence without a fix: parsed, not an error.
        let gga =
            parse_gga("$GPGGA,123519,4807.038,N,01131.000,E,0,00,0.9,545.4,M,46.9,M,,*47").unwrap();
        assert_eq!(gga.quality, 0);
    }

    #[test]
    fn test_provider_updates_only_on_quality_fix() {
        let provider = LocationProvider::new();
        assert_eq!(provider.current(), GpsFix::NoFix);

        // Non-GGA traffic and quality-0 sentences leave the snapshot alone
        provider.consume_line("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,,*6A");
        provider.consume_line("$GPGGA,123519,4807.038,N,01131.000,E,0,00,0.9,545.4,M,46.9,M,,*47");
        assert_eq!(provider.current(), GpsFix::NoFix);

        provider.consume_line(VALID_GGA);
        match provider.current() {
            GpsFix::Fix {
                latitude,
                longitude,
            } => {
                assert!((latitude - 48.1173).abs() < 1e-4);
                assert!((longitude - 11.516_667).abs() < 1e-4);
            }
            GpsFix::NoFix => panic!("expected a fix"),
        }

        // Garbage after a fix keeps the last-known value
        provider.consume_line("$GPGGA,not,even,close");
        assert!(provider.current().is_valid());
    }
}
