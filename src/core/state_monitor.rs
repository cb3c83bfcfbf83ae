// State monitoring orchestration
// Receives per-frame joint observations, maintains the sliding window, and
// publishes classification results to subscribers

use crate::core::classifier::SequenceClassifier;
use crate::core::config::MonitorConfig;
use crate::core::feature_tensor::FeatureTensorBuilder;
use crate::core::window_buffer::PoseWindowBuffer;
use crate::models::joint::JointObservation;
use crate::models::state::{Classification, MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};
use uuid::Uuid;

// ==============================================================================
// Session Statistics
// ==============================================================================

/// In-memory aggregates for the current monitoring session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub session_id: String,
    pub frames_received: u64,
    pub frames_classified: u64,
    pub label_counts: HashMap<String, u64>,
    pub label_transitions: u32,
    pub dominant_label: Option<String>,
    pub average_classification_time_ms: f32,
}

#[derive(Debug, Clone, Default)]
struct StatsCounters {
    frames_received: u64,
    frames_classified: u64,
    label_counts: HashMap<String, u64>,
    label_transitions: u32,
    total_classification_time_ms: u64,
    last_label: Option<String>,
}

// ==============================================================================
// State Monitor
// ==============================================================================

/// Orchestrates the per-frame flow: observation in, window update, tensor
/// build, classification, label out.
///
/// Observations are consumed by a single worker in arrival order, so the
/// window's chronology is never corrupted. Classification runs in its own
/// task: buffering never waits on it, at most one classification is in
/// flight, and a newer ready window supersedes an older in-flight one
/// rather than queuing behind it. Subscribers get labels through a watch
/// channel and may live on any scheduling context.
pub struct StateMonitor {
    config: MonitorConfig,
    classifier: Arc<SequenceClassifier>,
    current_session_id: Arc<RwLock<Option<String>>>,
    is_running: Arc<RwLock<bool>>,
    frame_tx: Arc<RwLock<Option<mpsc::Sender<JointObservation>>>>,
    state_tx: watch::Sender<Classification>,
    stats: Arc<RwLock<StatsCounters>>,
}

impl StateMonitor {
    /// Build a monitor; the sequence model (if configured) is loaded here,
    /// once, and a load failure pins the classifier to the heuristic variant
    pub fn new(config: MonitorConfig) -> Self {
        let classifier = Arc::new(SequenceClassifier::new(&config));
        let (state_tx, _) = watch::channel(Classification::waiting());

        Self {
            config,
            classifier,
            current_session_id: Arc::new(RwLock::new(None)),
            is_running: Arc::new(RwLock::new(false)),
            frame_tx: Arc::new(RwLock::new(None)),
            state_tx,
            stats: Arc::new(RwLock::new(StatsCounters::default())),
        }
    }

    /// Start a monitoring session
    pub async fn start(&self, session_id: Option<String>) -> MonitorResult<()> {
        let mut is_running = self.is_running.write().await;
        if *is_running {
            return Err(MonitorError::AlreadyRunning);
        }

        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        *self.current_session_id.write().await = Some(session_id.clone());
        *self.stats.write().await = StatsCounters::default();

        let (tx, rx) = mpsc::channel::<JointObservation>(self.config.channel_capacity);
        *self.frame_tx.write().await = Some(tx);

        *is_running = true;

        // Placeholder until the window is primed
        self.state_tx.send_replace(Classification::waiting());

        let window_size = self.config.window_size;
        let classifier = self.classifier.clone();
        let state_tx = self.state_tx.clone();
        let stats = self.stats.clone();
        let is_running_clone = self.is_running.clone();

        tokio::spawn(async move {
            Self::process_observations(rx, window_size, classifier, state_tx, stats, is_running_clone)
                .await;
        });

        println!("Started state monitoring for session {}", session_id);
        Ok(())
    }

    /// Stop the session; the buffered window is discarded with the worker
    pub async fn stop(&self) -> MonitorResult<()> {
        let mut is_running = self.is_running.write().await;
        if !*is_running {
            return Ok(());
        }

        // Drop the sender to signal the worker to stop
        *self.frame_tx.write().await = None;

        *is_running = false;
        *self.current_session_id.write().await = None;

        println!("Stopped state monitoring");
        Ok(())
    }

    /// Feed one frame's observation from the detection collaborator.
    /// Ignored when no session is running.
    pub async fn push_observation(&self, observation: JointObservation) -> MonitorResult<()> {
        let is_running = *self.is_running.read().await;
        if !is_running {
            return Ok(());
        }

        self.stats.write().await.frames_received += 1;

        if let Some(tx) = self.frame_tx.read().await.as_ref() {
            let _ = tx.send(observation).await;
        }

        Ok(())
    }

    /// Subscribe to published classifications
    pub fn subscribe(&self) -> watch::Receiver<Classification> {
        self.state_tx.subscribe()
    }

    /// The most recently published classification
    pub fn current_state(&self) -> Classification {
        self.state_tx.borrow().clone()
    }

    pub fn has_model(&self) -> bool {
        self.classifier.has_model()
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.current_session_id.read().await.clone()
    }

    /// Aggregates for the current session
    pub async fn statistics(&self) -> SessionStatistics {
        let counters = self.stats.read().await.clone();
        let session_id = self
            .current_session_id
            .read()
            .await
            .clone()
            .unwrap_or_default();

        let dominant_label = counters
            .label_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(label, _)| label.clone());

        let average_classification_time_ms = if counters.frames_classified > 0 {
            counters.total_classification_time_ms as f32 / counters.frames_classified as f32
        } else {
            0.0
        };

        SessionStatistics {
            session_id,
            frames_received: counters.frames_received,
            frames_classified: counters.frames_classified,
            label_counts: counters.label_counts,
            label_transitions: counters.label_transitions,
            dominant_label,
            average_classification_time_ms,
        }
    }

    /// Worker task: consumes observations in order and triggers classification
    async fn process_observations(
        mut rx: mpsc::Receiver<JointObservation>,
        window_size: usize,
        classifier: Arc<SequenceClassifier>,
        state_tx: watch::Sender<Classification>,
        stats: Arc<RwLock<StatsCounters>>,
        is_running: Arc<RwLock<bool>>,
    ) {
        let mut buffer = PoseWindowBuffer::new(window_size);
        let builder = FeatureTensorBuilder::new();
        let classification_in_flight = Arc::new(AtomicBool::new(false));

        while *is_running.read().await {
            match rx.recv().await {
                Some(observation) => {
                    buffer.push(observation);

                    if !buffer.is_ready() {
                        continue;
                    }

                    // At most one classification in flight; while one runs,
                    // newer windows supersede it instead of queuing
                    if classification_in_flight.swap(true, Ordering::SeqCst) {
                        continue;
                    }

                    let tensor = builder.build(&buffer.snapshot());
                    let classifier = classifier.clone();
                    let state_tx = state_tx.clone();
                    let stats = stats.clone();
                    let in_flight = classification_in_flight.clone();

                    tokio::spawn(async move {
                        let start = std::time::Instant::now();
                        let classification = classifier.classify(&tensor);
                        let elapsed_ms = start.elapsed().as_millis() as u64;

                        Self::record_classification(&stats, &classification, elapsed_ms).await;

                        state_tx.send_replace(classification);
                        in_flight.store(false, Ordering::SeqCst);
                    });
                }
                None => break, // Channel closed
            }
        }
    }

    async fn record_classification(
        stats: &Arc<RwLock<StatsCounters>>,
        classification: &Classification,
        elapsed_ms: u64,
    ) {
        let label = classification.label.to_string().to_string();

        let mut counters = stats.write().await;
        counters.frames_classified += 1;
        counters.total_classification_time_ms += elapsed_ms;

        if let Some(previous) = counters.last_label.as_deref() {
            if previous != label {
                counters.label_transitions += 1;
            }
        }

        *counters.label_counts.entry(label.clone()).or_insert(0) += 1;
        counters.last_label = Some(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::joint::{Joint, RecognizedPoint};
    use crate::models::state::{ClassifierSource, StateLabel};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    /// A frame with the nose sunk `drop` below level shoulders
    fn frame_with_head_drop(drop: f32, timestamp: i64) -> JointObservation {
        let shoulder_y = 0.5;
        JointObservation::from_detections(
            vec![
                (
                    Joint::Nose,
                    RecognizedPoint::new(0.5, shoulder_y - drop, 0.9),
                ),
                (
                    Joint::LeftShoulder,
                    RecognizedPoint::new(0.4, shoulder_y, 0.9),
                ),
                (
                    Joint::RightShoulder,
                    RecognizedPoint::new(0.6, shoulder_y, 0.9),
                ),
            ],
            0.3,
            timestamp,
        )
    }

    async fn await_next_state(rx: &mut watch::Receiver<Classification>) -> Classification {
        timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("Timed out waiting for a published state")
            .expect("State channel closed");
        rx.borrow().clone()
    }

    #[tokio::test]
    async fn test_waiting_until_window_is_primed() {
        let monitor = StateMonitor::new(MonitorConfig::default());
        monitor.start(None).await.unwrap();

        for i in 0..29 {
            monitor
                .push_observation(frame_with_head_drop(0.15, i))
                .await
                .unwrap();
        }

        sleep(Duration::from_millis(100)).await;
        assert_eq!(monitor.current_state().label, StateLabel::Waiting);

        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_drowsy_stream_classifies_drowsy_via_heuristic() {
        let monitor = StateMonitor::new(MonitorConfig::default());
        assert!(!monitor.has_model());

        monitor.start(Some("session-1".to_string())).await.unwrap();
        let mut rx = monitor.subscribe();

        // Shoulders level, nose 0.15 below the shoulder line, every frame
        for i in 0..30 {
            monitor
                .push_observation(frame_with_head_drop(0.15, i))
                .await
                .unwrap();
        }

        let state = await_next_state(&mut rx).await;
        assert_eq!(state.label, StateLabel::Drowsy);
        assert_eq!(state.source, Some(ClassifierSource::Heuristic));
        assert!(state.confidence.unwrap() <= 95.0);

        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_frames_publish_no_subject() {
        let monitor = StateMonitor::new(MonitorConfig::default());
        monitor.start(None).await.unwrap();
        let mut rx = monitor.subscribe();

        for i in 0..30 {
            monitor
                .push_observation(JointObservation::empty(i))
                .await
                .unwrap();
        }

        let state = await_next_state(&mut rx).await;
        assert_eq!(state.label, StateLabel::NoSubject);

        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_discards_window() {
        let monitor = StateMonitor::new(MonitorConfig::default());
        monitor.start(None).await.unwrap();
        let mut rx = monitor.subscribe();

        for i in 0..30 {
            monitor
                .push_observation(frame_with_head_drop(0.15, i))
                .await
                .unwrap();
        }
        let state = await_next_state(&mut rx).await;
        assert_eq!(state.label, StateLabel::Drowsy);

        monitor.stop().await.unwrap();
        monitor.start(None).await.unwrap();

        // A fresh session re-primes from scratch; 29 frames are not enough
        for i in 0..29 {
            monitor
                .push_observation(frame_with_head_drop(0.15, i))
                .await
                .unwrap();
        }

        sleep(Duration::from_millis(100)).await;
        assert_eq!(monitor.current_state().label, StateLabel::Waiting);

        let stats = monitor.statistics().await;
        assert_eq!(stats.frames_received, 29);
        assert_eq!(stats.frames_classified, 0);

        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_push_after_stop_is_ignored() {
        let monitor = StateMonitor::new(MonitorConfig::default());
        monitor.start(None).await.unwrap();
        monitor.stop().await.unwrap();

        monitor
            .push_observation(frame_with_head_drop(0.15, 0))
            .await
            .unwrap();

        let stats = monitor.statistics().await;
        assert_eq!(stats.frames_received, 0);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let monitor = StateMonitor::new(MonitorConfig::default());
        monitor.start(None).await.unwrap();

        assert!(matches!(
            monitor.start(None).await,
            Err(MonitorError::AlreadyRunning)
        ));

        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_statistics_track_labels_and_session() {
        let monitor = StateMonitor::new(MonitorConfig::default());
        monitor.start(Some("stats-session".to_string())).await.unwrap();
        let mut rx = monitor.subscribe();

        for i in 0..30 {
            monitor
                .push_observation(frame_with_head_drop(0.15, i))
                .await
                .unwrap();
        }
        let _ = await_next_state(&mut rx).await;

        let stats = monitor.statistics().await;
        assert_eq!(stats.session_id, "stats-session");
        assert_eq!(stats.frames_received, 30);
        assert!(stats.frames_classified >= 1);
        assert!(stats.label_counts.contains_key("drowsy"));
        assert_eq!(stats.dominant_label.as_deref(), Some("drowsy"));

        monitor.stop().await.unwrap();
    }
}
