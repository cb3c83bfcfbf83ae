// Sliding window over recent joint observations

use crate::models::joint::JointObservation;
use std::collections::VecDeque;

/// Fixed-capacity FIFO window of per-frame joint observations.
///
/// The window slides: once at capacity, every push evicts the oldest frame.
/// Observations are accepted unconditionally, empty frames included; an
/// empty frame still occupies a slot and shifts the window forward. The
/// fixed capacity is the buffer's sole resource-management duty.
pub struct PoseWindowBuffer {
    frames: VecDeque<JointObservation>,
    capacity: usize,
}

impl PoseWindowBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an observation at the tail, evicting from the head past capacity
    pub fn push(&mut self, observation: JointObservation) {
        self.frames.push_back(observation);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    /// True exactly when the window holds `capacity` frames
    pub fn is_ready(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the current window in chronological order, oldest first.
    /// Does not mutate the buffer.
    pub fn snapshot(&self) -> Vec<JointObservation> {
        self.frames.iter().cloned().collect()
    }

    /// Discard all buffered frames (used on stream stop)
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::joint::{Joint, RecognizedPoint};
    use std::collections::HashMap;

    fn observation_at(timestamp: i64) -> JointObservation {
        let mut joints = HashMap::new();
        joints.insert(Joint::Nose, RecognizedPoint::new(0.5, 0.3, 0.9));
        JointObservation::new(joints, timestamp)
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut buffer = PoseWindowBuffer::new(30);

        for i in 0..100 {
            buffer.push(observation_at(i));
            assert!(buffer.len() <= 30, "Length exceeded capacity at push {}", i);
        }

        assert_eq!(buffer.len(), 30);
    }

    #[test]
    fn test_fifo_eviction_keeps_last_pushes_in_order() {
        let mut buffer = PoseWindowBuffer::new(30);

        for i in 0..45 {
            buffer.push(observation_at(i));
        }

        let window = buffer.snapshot();
        assert_eq!(window.len(), 30);

        // The last 30 pushes, oldest first
        for (slot, observation) in window.iter().enumerate() {
            assert_eq!(observation.timestamp, 15 + slot as i64);
        }
    }

    #[test]
    fn test_readiness_at_exact_capacity_and_every_frame_after() {
        let mut buffer = PoseWindowBuffer::new(5);

        for i in 0..4 {
            buffer.push(observation_at(i));
            assert!(!buffer.is_ready());
        }

        buffer.push(observation_at(4));
        assert!(buffer.is_ready());

        // Readiness re-triggers on every subsequent push
        buffer.push(observation_at(5));
        assert!(buffer.is_ready());
        assert_eq!(buffer.snapshot()[0].timestamp, 1);
    }

    #[test]
    fn test_empty_observations_occupy_slots() {
        let mut buffer = PoseWindowBuffer::new(3);

        buffer.push(observation_at(0));
        buffer.push(JointObservation::empty(1));
        buffer.push(JointObservation::empty(2));

        assert!(buffer.is_ready());
        assert!(buffer.snapshot()[1].is_empty());
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut buffer = PoseWindowBuffer::new(2);
        buffer.push(observation_at(0));
        buffer.push(observation_at(1));

        let first = buffer.snapshot();
        let second = buffer.snapshot();
        assert_eq!(first.len(), second.len());
        assert!(buffer.is_ready());
    }

    #[test]
    fn test_clear_discards_window() {
        let mut buffer = PoseWindowBuffer::new(2);
        buffer.push(observation_at(0));
        buffer.push(observation_at(1));

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(!buffer.is_ready());
    }
}
