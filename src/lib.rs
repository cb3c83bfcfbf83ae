// vigil - pose-sequence drowsiness monitoring pipeline
//
// Turns a live stream of per-frame body-joint detections into a published
// behavioral-state label. A sliding window of observations is mapped into a
// dense feature tensor and classified by a trained sequence model when one
// is available, with a geometric heuristic as the fallback.

pub mod core;
pub mod models;

pub use crate::core::classifier::{HeuristicClassifier, SequenceClassifier};
pub use crate::core::config::MonitorConfig;
pub use crate::core::feature_tensor::{FeatureTensor, FeatureTensorBuilder};
pub use crate::core::model_assets::{ModelInfo, ModelManager, ModelSource};
pub use crate::core::model_bridge::{ModelPrediction, SequenceModel};
pub use crate::core::state_monitor::{SessionStatistics, StateMonitor};
pub use crate::core::window_buffer::PoseWindowBuffer;
pub use crate::models::joint::{Joint, JointObservation, RecognizedPoint};
pub use crate::models::state::{
    Classification, ClassifierSource, MonitorError, MonitorResult, StateLabel,
};
