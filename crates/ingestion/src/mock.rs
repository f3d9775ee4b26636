//! Mock observation feeds
//!
//! Stand-ins for the real transport, used by tests, demos, and mock runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    ObservationCallback, ObservationEvent, ObservationSource, PoseObservation, Quaternion,
    RawControlObservation, RawRangeObservation, Vector3,
};
use rand::Rng;
use tracing::debug;

/// What a mock feed produces.
#[derive(Debug, Clone)]
pub enum MockFeedKind {
    /// Shared ranging feed: cycles through the given external-id pairs
    Range { pairs: Vec<(u32, u32)> },
    /// Per-neighbor pose feed bound to one neighbor index
    Pose { neighbor_index: usize },
    /// Shared control feed: cycles through the given external ids
    Control { external_ids: Vec<u32> },
}

/// Mock feed configuration
#[derive(Debug, Clone)]
pub struct MockFeedConfig {
    /// Feed identifier
    pub source_id: String,

    /// Emission frequency (Hz)
    pub frequency_hz: f64,

    /// Produced event kind
    pub kind: MockFeedKind,
}

/// Mock observation feed
///
/// Generates synthetic observations on a background task.
pub struct MockObservationSource {
    config: MockFeedConfig,
    running: Arc<AtomicBool>,
}

impl MockObservationSource {
    /// Create a mock feed from a configuration
    pub fn new(config: MockFeedConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared ranging feed cycling through external-id pairs
    pub fn range_feed(source_id: &str, frequency_hz: f64, pairs: Vec<(u32, u32)>) -> Self {
        Self::new(MockFeedConfig {
            source_id: source_id.to_string(),
            frequency_hz,
            kind: MockFeedKind::Range { pairs },
        })
    }

    /// Pose feed bound to one neighbor index
    pub fn pose_feed(source_id: &str, frequency_hz: f64, neighbor_index: usize) -> Self {
        Self::new(MockFeedConfig {
            source_id: source_id.to_string(),
            frequency_hz,
            kind: MockFeedKind::Pose { neighbor_index },
        })
    }

    /// Shared control feed cycling through external ids
    pub fn control_feed(source_id: &str, frequency_hz: f64, external_ids: Vec<u32>) -> Self {
        Self::new(MockFeedConfig {
            source_id: source_id.to_string(),
            frequency_hz,
            kind: MockFeedKind::Control { external_ids },
        })
    }
}

impl ObservationSource for MockObservationSource {
    fn source_id(&self) -> &str {
        &self.config.source_id
    }

    fn listen(&self, callback: ObservationCallback) {
        // Idempotent: a second listen() keeps the first task.
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            let period = Duration::from_secs_f64(1.0 / config.frequency_hz);
            let mut interval = tokio::time::interval(period);
            let start = std::time::Instant::now();
            let mut cursor = 0usize;

            debug!(
                source_id = %config.source_id,
                frequency_hz = config.frequency_hz,
                "mock observation source started"
            );

            while running.load(Ordering::Relaxed) {
                interval.tick().await;
                let timestamp = start.elapsed().as_secs_f64();

                let event = match &config.kind {
                    MockFeedKind::Range { pairs } => {
                        if pairs.is_empty() {
                            continue;
                        }
                        let (from_id, to_id) = pairs[cursor % pairs.len()];
                        cursor += 1;
                        ObservationEvent::Range(RawRangeObservation {
                            from_id,
                            to_id,
                            distance: rand::rng().random_range(1.0..25.0),
                            timestamp,
                        })
                    }
                    MockFeedKind::Pose { neighbor_index } => ObservationEvent::Pose {
                        neighbor_index: *neighbor_index,
                        pose: PoseObservation {
                            position: Vector3 {
                                x: rand::rng().random_range(-50.0..50.0),
                                y: rand::rng().random_range(-50.0..50.0),
                                z: 0.0,
                            },
                            orientation: Quaternion::default(),
                            covariance: vec![0.0; 36],
                            timestamp,
                        },
                    },
                    MockFeedKind::Control { external_ids } => {
                        if external_ids.is_empty() {
                            continue;
                        }
                        let car_id = external_ids[cursor % external_ids.len()];
                        cursor += 1;
                        ObservationEvent::Control(RawControlObservation {
                            car_id,
                            velocity: rand::rng().random_range(0.0..5.0),
                            steering: rand::rng().random_range(-0.5..0.5),
                            timestamp,
                        })
                    }
                };

                callback(event);
            }

            debug!(source_id = %config.source_id, "mock observation source stopped");
        });
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
