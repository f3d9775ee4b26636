//! Ingestion pipeline main entry

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{ObservationEvent, ObservationSource};
use tracing::{debug, info, instrument};

use crate::adapter::FeedAdapter;
use crate::config::{BackpressureConfig, IngestionMetrics};

/// Ingestion pipeline
///
/// Manages the registered observation feeds and funnels them into one
/// bounded event channel consumed by the aggregation loop. Mock feeds and
/// real transports register through the same interface.
pub struct IngestionPipeline {
    /// Registered feed adapters
    adapters: HashMap<String, FeedAdapter>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Event sender (shared by all adapters)
    tx: Sender<ObservationEvent>,

    /// Event receiver, handed out once
    rx: Option<Receiver<ObservationEvent>>,

    /// Default backpressure configuration
    default_config: BackpressureConfig,
}

impl IngestionPipeline {
    /// Create a new ingestion pipeline
    ///
    /// # Arguments
    /// * `channel_capacity` - Event channel capacity
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_config(BackpressureConfig {
            channel_capacity,
            ..Default::default()
        })
    }

    /// Create with custom backpressure configuration
    pub fn with_config(config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity);

        Self {
            adapters: HashMap::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            rx: Some(rx),
            default_config: config,
        }
    }

    /// Register an observation feed.
    ///
    /// # Arguments
    /// * `source_id` - Feed identifier (used for logging/metrics)
    /// * `source` - Feed implementing the `ObservationSource` trait
    /// * `config` - Optional per-feed backpressure configuration
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source, config),
        fields(source_id = %source_id)
    )]
    pub fn register_source(
        &mut self,
        source_id: String,
        source: Box<dyn ObservationSource>,
        config: Option<BackpressureConfig>,
    ) {
        let adapter = FeedAdapter::new(
            source_id.clone(),
            source,
            config.unwrap_or_else(|| self.default_config.clone()),
        );
        debug!(source_id = %source_id, "registered observation source");
        self.adapters.insert(source_id, adapter);
    }

    /// Start all registered feeds and return the event receiver.
    ///
    /// The receiver can only be taken once; subsequent calls return `None`
    /// for the receiver slot but still (re)start the adapters.
    #[instrument(name = "ingestion_start", skip(self))]
    pub fn start(&mut self) -> Option<Receiver<ObservationEvent>> {
        let rx = self.rx.take();

        for adapter in self.adapters.values() {
            // DropOldest eviction needs its own receiver handle; the channel
            // is MPMC so this does not steal events from the main consumer
            // except to evict when full.
            if let Some(ref main_rx) = rx {
                adapter.start(self.tx.clone(), main_rx.clone(), Arc::clone(&self.metrics));
            }
        }

        info!(feeds = self.adapters.len(), "ingestion pipeline started");
        rx
    }

    /// Stop all feeds.
    #[instrument(name = "ingestion_stop", skip(self))]
    pub fn stop(&self) {
        for adapter in self.adapters.values() {
            adapter.stop();
        }
        info!(feeds = self.adapters.len(), "ingestion pipeline stopped");
    }

    /// Number of registered feeds.
    pub fn feed_count(&self) -> usize {
        self.adapters.len()
    }

    /// Shared ingestion metrics.
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockObservationSource;

    #[tokio::test]
    async fn test_register_and_start() {
        let mut pipeline = IngestionPipeline::new(100);
        pipeline.register_source(
            "ranges".to_string(),
            Box::new(MockObservationSource::range_feed(
                "ranges",
                50.0,
                vec![(101, 100), (100, 102)],
            )),
            None,
        );

        assert_eq!(pipeline.feed_count(), 1);

        let rx = pipeline.start().expect("receiver available on first start");
        let event = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("mock feed produces within a second")
            .unwrap();
        assert!(matches!(event, ObservationEvent::Range(_)));

        pipeline.stop();
    }

    #[tokio::test]
    async fn test_receiver_taken_once() {
        let mut pipeline = IngestionPipeline::new(10);
        assert!(pipeline.start().is_some());
        assert!(pipeline.start().is_none());
    }
}
