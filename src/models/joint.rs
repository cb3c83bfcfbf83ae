// Data models for per-frame body-joint detections

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==============================================================================
// Joint Identifiers
// ==============================================================================

/// Body joint identifiers with stable tensor indices.
///
/// Indices 0-16 are the detector-provided joints in COCO order. `Neck` (17)
/// is never supplied by the detector; it is synthesized from the shoulders
/// during feature extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Joint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
    Neck = 17,
}

impl Joint {
    /// Total number of joints in the tensor index space, derived neck included
    pub const COUNT: usize = 18;

    /// Joints the detector can actually report, in index order
    pub const DETECTOR_JOINTS: [Joint; 17] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Stable tensor index of this joint
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// True for joints that are computed rather than detected
    pub fn is_derived(&self) -> bool {
        matches!(self, Joint::Neck)
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "left_eye",
            Joint::RightEye => "right_eye",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
            Joint::Neck => "neck",
        }
    }
}

// ==============================================================================
// Recognized Point
// ==============================================================================

/// A single joint detection with confidence score
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecognizedPoint {
    pub x: f32,          // Normalized [0, 1] image coordinates
    pub y: f32,          // Normalized [0, 1] image coordinates
    pub confidence: f32, // Detection confidence [0, 1]
}

impl RecognizedPoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }
}

// ==============================================================================
// Joint Observation (one frame)
// ==============================================================================

/// All joints that cleared the confidence threshold in a single frame.
///
/// Joints below threshold are absent from the map, not zero-filled; an empty
/// observation means no subject was usable that frame. Immutable after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointObservation {
    joints: HashMap<Joint, RecognizedPoint>,
    pub timestamp: i64,
}

impl JointObservation {
    /// Wrap a pre-filtered detector result
    pub fn new(joints: HashMap<Joint, RecognizedPoint>, timestamp: i64) -> Self {
        Self { joints, timestamp }
    }

    /// An observation with no usable joints (no subject detected)
    pub fn empty(timestamp: i64) -> Self {
        Self {
            joints: HashMap::new(),
            timestamp,
        }
    }

    /// Build an observation from raw detections, keeping only joints whose
    /// confidence is strictly above `threshold`. Derived joints are ignored;
    /// the detector cannot supply them.
    pub fn from_detections<I>(detections: I, threshold: f32, timestamp: i64) -> Self
    where
        I: IntoIterator<Item = (Joint, RecognizedPoint)>,
    {
        let joints = detections
            .into_iter()
            .filter(|(joint, point)| !joint.is_derived() && point.is_confident(threshold))
            .collect();

        Self { joints, timestamp }
    }

    pub fn get(&self, joint: Joint) -> Option<&RecognizedPoint> {
        self.joints.get(&joint)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_indices_are_stable() {
        assert_eq!(Joint::Nose.index(), 0);
        assert_eq!(Joint::LeftShoulder.index(), 5);
        assert_eq!(Joint::RightShoulder.index(), 6);
        assert_eq!(Joint::RightAnkle.index(), 16);
        assert_eq!(Joint::Neck.index(), 17);
        assert_eq!(Joint::DETECTOR_JOINTS.len(), 17);
        assert_eq!(Joint::COUNT, 18);
    }

    #[test]
    fn test_detector_joints_exclude_derived() {
        assert!(Joint::DETECTOR_JOINTS.iter().all(|j| !j.is_derived()));
        assert!(Joint::Neck.is_derived());
    }

    #[test]
    fn test_recognized_point_confidence() {
        let point = RecognizedPoint::new(0.5, 0.5, 0.3);
        assert!(!point.is_confident(0.3), "Threshold is strict");
        assert!(point.is_confident(0.2));
    }

    #[test]
    fn test_from_detections_filters_below_threshold() {
        let observation = JointObservation::from_detections(
            vec![
                (Joint::Nose, RecognizedPoint::new(0.5, 0.3, 0.25)),
                (Joint::LeftShoulder, RecognizedPoint::new(0.4, 0.5, 0.9)),
                (Joint::RightShoulder, RecognizedPoint::new(0.6, 0.5, 0.3)),
            ],
            0.3,
            0,
        );

        assert!(observation.get(Joint::Nose).is_none());
        assert!(observation.get(Joint::LeftShoulder).is_some());
        assert!(
            observation.get(Joint::RightShoulder).is_none(),
            "Confidence exactly at threshold does not clear it"
        );
        assert_eq!(observation.len(), 1);
    }

    #[test]
    fn test_from_detections_rejects_derived_joints() {
        let observation = JointObservation::from_detections(
            vec![(Joint::Neck, RecognizedPoint::new(0.5, 0.5, 0.9))],
            0.3,
            0,
        );

        assert!(observation.is_empty());
    }

    #[test]
    fn test_empty_observation() {
        let observation = JointObservation::empty(42);
        assert!(observation.is_empty());
        assert_eq!(observation.timestamp, 42);
    }
}
