// Data models for published behavioral-state labels and monitor errors

use serde::{Deserialize, Serialize};

// ==============================================================================
// State Label
// ==============================================================================

/// Behavioral state published to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateLabel {
    /// Window not yet primed; placeholder until the first classification
    Waiting,
    Alert,
    Drowsy,
    /// Not enough confident joints to classify the current frame
    Unknown,
    /// No subject detected in the current frame
    NoSubject,
}

impl StateLabel {
    pub fn to_string(&self) -> &'static str {
        match self {
            StateLabel::Waiting => "waiting",
            StateLabel::Alert => "alert",
            StateLabel::Drowsy => "drowsy",
            StateLabel::Unknown => "unknown",
            StateLabel::NoSubject => "no_subject",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "waiting" => StateLabel::Waiting,
            "alert" => StateLabel::Alert,
            "drowsy" => StateLabel::Drowsy,
            "no_subject" => StateLabel::NoSubject,
            _ => StateLabel::Unknown,
        }
    }
}

/// Which classifier variant produced a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierSource {
    Model,
    Heuristic,
}

// ==============================================================================
// Classification (published value)
// ==============================================================================

/// One published classification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub label: StateLabel,
    /// Auxiliary score; present for the heuristic variant and for model
    /// outputs that report per-category probabilities
    pub confidence: Option<f32>,
    /// Absent for the pre-priming placeholder
    pub source: Option<ClassifierSource>,
    pub timestamp: i64,
}

impl Classification {
    pub fn new(label: StateLabel, confidence: Option<f32>, source: ClassifierSource) -> Self {
        Self {
            label,
            confidence,
            source: Some(source),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// The placeholder published before the window is primed
    pub fn waiting() -> Self {
        Self {
            label: StateLabel::Waiting,
            confidence: None,
            source: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("State monitoring already running")]
    AlreadyRunning,

    #[error("State monitoring not running")]
    NotRunning,

    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
