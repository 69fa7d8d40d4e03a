// src/main.rs

mod camera;
mod config;
mod detector;
mod event_log;
mod geofence;
mod gps;
mod pipeline;
mod postprocess;
mod preprocess;
mod severity;
mod types;
mod upload;

use anyhow::Result;
use event_log::EventLogger;
use gps::LocationProvider;
use pipeline::FramePipeline;
use std::path::Path;
use tracing::{error, info};
use types::Config;
use upload::{ScriptUploadSink, UploadGate};

fn main() -> Result<()> {
    let config = Config::load_or_default("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "road_anomaly_detection={},ort=warn",
            config.logging.level
        ))
        .init();

    info!("🚀 Road Anomaly Detection System Starting");
    info!(
        "Thresholds: conf={:.2}, nms={:.2}, upload radius={:.0}m",
        config.detection.confidence_threshold,
        config.detection.nms_threshold,
        config.upload.radius_meters
    );

    // Missing model artifact is fatal; the loop must not start.
    if !Path::new(&config.model.path).exists() {
        error!("❌ Model file not found: {}", config.model.path);
        anyhow::bail!("model artifact missing: {}", config.model.path);
    }

    let location = LocationProvider::new();
    location.spawn_reader(&config.gps.device);

    let logger = EventLogger::new(&config.logging.event_log);
    let gate = UploadGate::new(
        ScriptUploadSink::new(config.upload.command.clone()),
        &config.upload,
    );
    let pipeline = FramePipeline::new(config.severity.clone(), logger, gate, location);

    #[cfg(all(feature = "backend-ort", feature = "camera-opencv"))]
    {
        run_live(&config, pipeline)
    }

    #[cfg(not(all(feature = "backend-ort", feature = "camera-opencv")))]
    {
        let _ = pipeline;
        tracing::warn!(
            "Built without the 'backend-ort' and 'camera-opencv' features; \
             live detection loop unavailable"
        );
        Ok(())
    }
}

#[cfg(all(feature = "backend-ort", feature = "camera-opencv"))]
fn run_live(config: &Config, mut pipeline: FramePipeline<ScriptUploadSink>) -> Result<()> {
    use detector::{Detector, OrtDetector};
    use postprocess::Postprocessor;

    let mut detector = OrtDetector::new(
        &config.model.path,
        config.model.input_size,
        config.model.num_classes,
    )?;
    let postprocessor = Postprocessor::new(
        config.detection.confidence_threshold,
        config.detection.nms_threshold,
        config.model.input_size,
    );
    let mut camera = camera::Camera::open(config.camera.index)?;

    info!("🚗 System monitoring... Press 'q' to quit.");

    loop {
        let (mut display, frame) = match camera.read()? {
            Some(pair) => pair,
            None => break,
        };

        let input = preprocess::preprocess(
            &frame.data,
            frame.width as usize,
            frame.height as usize,
            config.model.input_size,
        );
        let raw = detector.infer(&input)?;
        let detections = postprocessor.run(&raw.data, raw.stride, frame.width, frame.height);

        let summary = pipeline.process(&detections, frame.width, frame.height, chrono::Local::now())?;

        camera::draw_overlays(&mut display, &summary)?;
        if !camera::show(&config.camera.window_title, &display)? {
            break;
        }
    }

    info!("Shutting down");
    Ok(())
}
