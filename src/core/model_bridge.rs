// Sequence-model collaborator bridge
// Abstraction over the trained sequence classifier; the native backend uses
// ONNX Runtime behind the `ml-onnx` feature.

use crate::core::feature_tensor::FeatureTensor;
use crate::models::state::{MonitorError, MonitorResult};
use std::collections::HashMap;
use std::path::Path;

/// Output categories in model output order
pub const STATE_CATEGORIES: [&str; 2] = ["alert", "drowsy"];

/// One model prediction: a named category, optionally with per-category scores
#[derive(Debug, Clone)]
pub struct ModelPrediction {
    pub label: String,
    pub probabilities: Option<HashMap<String, f32>>,
}

/// Black-box sequence classifier boundary.
///
/// Implementations consume a `[30, 3, 18]` f32 feature tensor and return a
/// named output category. Shape mismatches and missing outputs are inference
/// failures, not panics.
pub trait SequenceModel: Send + Sync {
    /// Run inference on one feature tensor
    fn infer(&self, tensor: &FeatureTensor) -> MonitorResult<ModelPrediction>;

    /// Get model info
    fn model_info(&self) -> String;
}

/// Load the sequence model from a file, selecting the compiled-in backend.
///
/// Without an ML feature this always fails, which the classifier treats as
/// a permanent fallback to the heuristic variant.
pub fn load_model(model_path: &Path, window_size: usize) -> MonitorResult<Box<dyn SequenceModel>> {
    #[cfg(feature = "ml-onnx")]
    {
        let model = onnx_backend::OnnxSequenceModel::load(model_path, window_size)?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "ml-onnx"))]
    {
        let _ = (model_path, window_size);
        Err(MonitorError::ModelLoadFailed(
            "built without an ML backend (enable the 'ml-onnx' feature)".to_string(),
        ))
    }
}

// ==============================================================================
// ONNX Runtime Implementation
// ==============================================================================

#[cfg(feature = "ml-onnx")]
pub mod onnx_backend {
    use super::*;
    use crate::core::feature_tensor::COORDINATE_CHANNELS;
    use crate::models::joint::Joint;
    use ort::{GraphOptimizationLevel, Session, SessionBuilder, Tensor};

    pub struct OnnxSequenceModel {
        session: Session,
        window_size: usize,
    }

    impl OnnxSequenceModel {
        pub fn load(model_path: &Path, window_size: usize) -> MonitorResult<Self> {
            let session = SessionBuilder::new()
                .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?
                .with_optimization_level(GraphOptimizationLevel::All)
                .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;

            Ok(Self {
                session,
                window_size,
            })
        }
    }

    impl SequenceModel for OnnxSequenceModel {
        fn infer(&self, tensor: &FeatureTensor) -> MonitorResult<ModelPrediction> {
            let [frames, channels, joints] = tensor.shape();
            if frames != self.window_size || channels != COORDINATE_CHANNELS || joints != Joint::COUNT {
                return Err(MonitorError::InferenceFailed(format!(
                    "unexpected tensor shape [{}, {}, {}]",
                    frames, channels, joints
                )));
            }

            let input = Tensor::from_array(
                tensor.as_slice().to_vec(),
                [frames as i64, channels as i64, joints as i64],
            )
            .map_err(|e| MonitorError::InferenceFailed(e.to_string()))?;

            let outputs = self
                .session
                .run(vec![input])
                .map_err(|e| MonitorError::InferenceFailed(e.to_string()))?;

            let output = outputs.get(0).ok_or_else(|| {
                MonitorError::InferenceFailed("model produced no outputs".to_string())
            })?;

            let scores: Tensor<f32> = output
                .try_extract()
                .map_err(|e| MonitorError::InferenceFailed(e.to_string()))?;

            let shape = scores.shape();
            if shape.is_empty() {
                return Err(MonitorError::InferenceFailed(
                    "model output has no shape".to_string(),
                ));
            }

            let mut probabilities = HashMap::new();
            let mut best: Option<(&str, f32)> = None;

            for (index, category) in STATE_CATEGORIES.iter().enumerate() {
                let score = if shape.len() >= 2 {
                    scores[[0, index]]
                } else {
                    scores[[index]]
                };

                probabilities.insert(category.to_string(), score);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((category, score));
                }
            }

            let (label, _) = best.ok_or_else(|| {
                MonitorError::InferenceFailed("model output has no categories".to_string())
            })?;

            Ok(ModelPrediction {
                label: label.to_string(),
                probabilities: Some(probabilities),
            })
        }

        fn model_info(&self) -> String {
            format!(
                "ONNX sequence classifier (window {}, categories {:?})",
                self.window_size, STATE_CATEGORIES
            )
        }
    }
}
