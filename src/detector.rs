// src/detector.rs
//
// Model boundary. The pipeline only sees candidate rows; which runtime
// produced them is a backend concern behind the `Detector` trait.

use anyhow::Result;

/// Raw model output as candidate rows: `stride` floats per candidate,
/// 4 center-form box parameters followed by per-class scores.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub data: Vec<f32>,
    pub stride: usize,
}

impl RawOutput {
    pub fn candidate_count(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }
}

pub trait Detector {
    /// Runs inference on a preprocessed (1, 3, size, size) CHW tensor.
    fn infer(&mut self, input: &[f32]) -> Result<RawOutput>;
}

#[cfg(feature = "backend-ort")]
pub use self::ort_backend::OrtDetector;

#[cfg(feature = "backend-ort")]
mod ort_backend {
    use super::{Detector, RawOutput};
    use anyhow::{Context, Result};
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use tracing::{debug, info};

    /// ONNX Runtime backend on the CPU execution provider.
    pub struct OrtDetector {
        session: Session,
        input_size: usize,
        stride: usize,
    }

    impl OrtDetector {
        pub fn new(model_path: &str, input_size: usize, num_classes: usize) -> Result<Self> {
            info!("Loading detection model: {}", model_path);

            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_intra_threads(4)?
                .commit_from_file(model_path)
                .context("Failed to load model")?;

            info!("✓ Detector initialized");

            Ok(Self {
                session,
                input_size,
                stride: 4 + num_classes,
            })
        }
    }

    impl Detector for OrtDetector {
        fn infer(&mut self, input: &[f32]) -> Result<RawOutput> {
            let shape = [1, 3, self.input_size, self.input_size];
            let input_value = ort::value::Value::from_array((
                shape.as_slice(),
                input.to_vec().into_boxed_slice(),
            ))?;

            let outputs = self.session.run(ort::inputs!["images" => input_value])?;
            let (output_shape, data) = outputs[0].try_extract_tensor::<f32>()?;

            debug!("Model output shape: {:?}", output_shape);

            // The model emits (1, 4 + num_classes, N); transpose into N
            // row-major candidates.
            let attrs = self.stride;
            if data.len() % attrs != 0 {
                anyhow::bail!(
                    "Unexpected output size {} for {} attributes per candidate",
                    data.len(),
                    attrs
                );
            }
            let candidates = data.len() / attrs;

            let mut rows = vec![0.0f32; data.len()];
            for i in 0..candidates {
                for a in 0..attrs {
                    rows[i * attrs + a] = data[a * candidates + i];
                }
            }

            Ok(RawOutput {
                data: rows,
                stride: attrs,
            })
        }
    }
}
