// Feature tensor construction from a window of joint observations

use crate::models::joint::{Joint, JointObservation};

/// Number of coordinate channels per joint: x, y, confidence
pub const COORDINATE_CHANNELS: usize = 3;

/// Channel indices within a joint's triple
pub const CHANNEL_X: usize = 0;
pub const CHANNEL_Y: usize = 1;
pub const CHANNEL_CONFIDENCE: usize = 2;

// ==============================================================================
// Feature Tensor
// ==============================================================================

/// Dense `[frames, 3, 18]` f32 tensor, zero-filled by default.
///
/// Built fresh per classification call and never mutated after handoff.
/// Layout is row-major over (frame, channel, joint).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTensor {
    data: Vec<f32>,
    frames: usize,
}

impl FeatureTensor {
    pub fn zeros(frames: usize) -> Self {
        Self {
            data: vec![0.0; frames * COORDINATE_CHANNELS * Joint::COUNT],
            frames,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.frames, COORDINATE_CHANNELS, Joint::COUNT]
    }

    pub fn at(&self, frame: usize, channel: usize, joint: usize) -> f32 {
        self.data[Self::offset(frame, channel, joint)]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn set(&mut self, frame: usize, channel: usize, joint: usize, value: f32) {
        let offset = Self::offset(frame, channel, joint);
        self.data[offset] = value;
    }

    fn offset(frame: usize, channel: usize, joint: usize) -> usize {
        (frame * COORDINATE_CHANNELS + channel) * Joint::COUNT + joint
    }
}

// ==============================================================================
// Feature Tensor Builder
// ==============================================================================

/// Maps a chronological window of observations into a feature tensor.
///
/// Per frame: each detector joint present in the observation writes its
/// (x, y, confidence) triple at the joint's fixed index; absent joints stay
/// zero. The neck is synthesized from the shoulder midpoint when both
/// shoulders are present, else left zero. Purely per-frame, no cross-frame
/// smoothing; deterministic for identical window contents.
#[derive(Debug, Default)]
pub struct FeatureTensorBuilder;

impl FeatureTensorBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, window: &[JointObservation]) -> FeatureTensor {
        let mut tensor = FeatureTensor::zeros(window.len());

        for (frame, observation) in window.iter().enumerate() {
            for joint in Joint::DETECTOR_JOINTS {
                if let Some(point) = observation.get(joint) {
                    let index = joint.index();
                    tensor.set(frame, CHANNEL_X, index, point.x);
                    tensor.set(frame, CHANNEL_Y, index, point.y);
                    tensor.set(frame, CHANNEL_CONFIDENCE, index, point.confidence);
                }
            }

            self.synthesize_neck(&mut tensor, frame, observation);
        }

        tensor
    }

    /// Neck = shoulder midpoint with averaged confidence, both shoulders required
    fn synthesize_neck(
        &self,
        tensor: &mut FeatureTensor,
        frame: usize,
        observation: &JointObservation,
    ) {
        let left = observation.get(Joint::LeftShoulder);
        let right = observation.get(Joint::RightShoulder);

        if let (Some(left), Some(right)) = (left, right) {
            let index = Joint::Neck.index();
            tensor.set(frame, CHANNEL_X, index, (left.x + right.x) / 2.0);
            tensor.set(frame, CHANNEL_Y, index, (left.y + right.y) / 2.0);
            tensor.set(
                frame,
                CHANNEL_CONFIDENCE,
                index,
                (left.confidence + right.confidence) / 2.0,
            );
        }
    }
}
