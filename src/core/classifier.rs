// Sequence classification - model-backed inference with heuristic fallback

use crate::core::config::MonitorConfig;
use crate::core::feature_tensor::{
    FeatureTensor, CHANNEL_CONFIDENCE, CHANNEL_Y,
};
use crate::core::model_bridge::{load_model, ModelPrediction, SequenceModel};
use crate::models::joint::Joint;
use crate::models::state::{Classification, ClassifierSource, StateLabel};

/// Upper bound on the heuristic's reported confidence score
pub const HEURISTIC_CONFIDENCE_CAP: f32 = 95.0;

// ==============================================================================
// Heuristic Classifier
// ==============================================================================

/// Rule-based fallback classifier over head-to-shoulder geometry.
///
/// Looks only at the most recent frame's nose and shoulders. Coordinates are
/// normalized with the origin at the bottom-left, so a dropped head lowers
/// the nose toward and below the shoulder line. The reported confidence,
/// `min(|head_drop| * 100, 95)`, is a display score and not a calibrated
/// probability; the scaling and cap are kept as-is for parity with the
/// trained model's UI treatment.
pub struct HeuristicClassifier {
    confidence_threshold: f32,
    drop_threshold: f32,
}

impl HeuristicClassifier {
    pub fn new(confidence_threshold: f32, drop_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            drop_threshold,
        }
    }

    /// Classify from the most recent frame of the tensor.
    ///
    /// Requires nose and both shoulders above the confidence threshold;
    /// otherwise the frame is unclassifiable and surfaces as `Unknown`.
    pub fn classify(&self, tensor: &FeatureTensor) -> Classification {
        if tensor.frames() == 0 {
            return Classification::new(StateLabel::Unknown, None, ClassifierSource::Heuristic);
        }

        let frame = tensor.frames() - 1;
        let nose = Joint::Nose.index();
        let left_shoulder = Joint::LeftShoulder.index();
        let right_shoulder = Joint::RightShoulder.index();

        let nose_confidence = tensor.at(frame, CHANNEL_CONFIDENCE, nose);
        let left_confidence = tensor.at(frame, CHANNEL_CONFIDENCE, left_shoulder);
        let right_confidence = tensor.at(frame, CHANNEL_CONFIDENCE, right_shoulder);

        if nose_confidence <= self.confidence_threshold
            || left_confidence <= self.confidence_threshold
            || right_confidence <= self.confidence_threshold
        {
            return Classification::new(StateLabel::Unknown, None, ClassifierSource::Heuristic);
        }

        let nose_y = tensor.at(frame, CHANNEL_Y, nose);
        let shoulder_y = (tensor.at(frame, CHANNEL_Y, left_shoulder)
            + tensor.at(frame, CHANNEL_Y, right_shoulder))
            / 2.0;

        // How far the nose has sunk below the shoulder line
        let head_drop = shoulder_y - nose_y;

        let label = if head_drop > self.drop_threshold {
            StateLabel::Drowsy
        } else {
            StateLabel::Alert
        };

        let confidence = (head_drop.abs() * 100.0).min(HEURISTIC_CONFIDENCE_CAP);

        Classification::new(label, Some(confidence), ClassifierSource::Heuristic)
    }
}

// ==============================================================================
// Sequence Classifier (variant dispatch)
// ==============================================================================

/// Classifier over feature tensors, model-backed when a model is available.
///
/// Model loading is attempted once at construction; a load failure makes the
/// model permanently unavailable for this classifier and every call uses the
/// heuristic. A per-call inference failure falls back to the heuristic for
/// that call only.
pub struct SequenceClassifier {
    model: Option<Box<dyn SequenceModel>>,
    heuristic: HeuristicClassifier,
}

impl SequenceClassifier {
    pub fn new(config: &MonitorConfig) -> Self {
        let model = config.model_path.as_ref().and_then(|path| {
            match load_model(path, config.window_size) {
                Ok(model) => {
                    println!("Loaded sequence model: {}", model.model_info());
                    Some(model)
                }
                Err(e) => {
                    eprintln!("Sequence model unavailable, using heuristic classifier: {}", e);
                    None
                }
            }
        });

        Self {
            model,
            heuristic: Self::heuristic_from(config),
        }
    }

    /// Build around an already-loaded model collaborator
    pub fn with_model(model: Box<dyn SequenceModel>, config: &MonitorConfig) -> Self {
        Self {
            model: Some(model),
            heuristic: Self::heuristic_from(config),
        }
    }

    fn heuristic_from(config: &MonitorConfig) -> HeuristicClassifier {
        HeuristicClassifier::new(config.confidence_threshold, config.drowsy_tilt_threshold)
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Classify one feature tensor into a state label.
    ///
    /// Always yields a label: a frame with no usable joints short-circuits to
    /// `NoSubject` before any model dispatch, and every failure path ends in
    /// the heuristic.
    pub fn classify(&self, tensor: &FeatureTensor) -> Classification {
        if tensor.frames() == 0 {
            return Classification::new(StateLabel::Unknown, None, ClassifierSource::Heuristic);
        }

        if Self::latest_frame_is_empty(tensor) {
            return Classification::new(StateLabel::NoSubject, None, ClassifierSource::Heuristic);
        }

        if let Some(model) = &self.model {
            match model.infer(tensor) {
                Ok(prediction) => return Self::interpret(prediction),
                Err(e) => {
                    eprintln!("Inference failed, falling back to heuristic for this frame: {}", e);
                }
            }
        }

        self.heuristic.classify(tensor)
    }

    /// True when the newest frame carries no joint at any confidence
    fn latest_frame_is_empty(tensor: &FeatureTensor) -> bool {
        let frame = tensor.frames() - 1;
        (0..Joint::COUNT).all(|joint| tensor.at(frame, CHANNEL_CONFIDENCE, joint) == 0.0)
    }

    fn interpret(prediction: ModelPrediction) -> Classification {
        let confidence = prediction
            .probabilities
            .as_ref()
            .and_then(|scores| scores.get(&prediction.label))
            .copied();

        Classification::new(
            StateLabel::from_string(&prediction.label),
            confidence,
            ClassifierSource::Model,
        )
    }
}
