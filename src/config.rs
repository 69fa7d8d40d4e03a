// src/config.rs

use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::warn;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Missing config file is not an error; built-in defaults apply.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            warn!("Config file {} not found, using defaults", path);
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            anyhow::bail!(
                "confidence_threshold must be in [0, 1], got {}",
                self.detection.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.detection.nms_threshold) {
            anyhow::bail!(
                "nms_threshold must be in [0, 1], got {}",
                self.detection.nms_threshold
            );
        }
        if self.model.input_size == 0 {
            anyhow::bail!("model input_size must be nonzero");
        }
        if self.severity.medium_ratio_pct >= self.severity.high_ratio_pct {
            anyhow::bail!(
                "severity bands must be ordered: medium {} < high {}",
                self.severity.medium_ratio_pct,
                self.severity.high_ratio_pct
            );
        }
        if !self.upload.radius_meters.is_finite() || self.upload.radius_meters < 0.0 {
            anyhow::bail!(
                "upload radius_meters must be a non-negative number, got {}",
                self.upload.radius_meters
            );
        }
        Ok(())
    }
}
