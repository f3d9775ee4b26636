//! Feed adapter - bridges an ObservationSource callback into the shared
//! event channel.

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{DropPolicy, ObservationEvent, ObservationSource};
use tracing::{debug, trace, warn};

use crate::config::{BackpressureConfig, IngestionMetrics};

/// Adapter around one observation feed.
///
/// Registers a callback on the underlying source; the callback performs the
/// bounded translate-validate-write sequence (try_send + drop policy) and
/// returns without blocking.
pub struct FeedAdapter {
    source_id: String,
    source: Box<dyn ObservationSource>,
    config: BackpressureConfig,
}

impl FeedAdapter {
    /// Create an adapter for one feed.
    pub fn new(
        source_id: String,
        source: Box<dyn ObservationSource>,
        config: BackpressureConfig,
    ) -> Self {
        Self {
            source_id,
            source,
            config,
        }
    }

    /// Feed identifier.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Start forwarding events into the shared channel.
    pub fn start(
        &self,
        tx: Sender<ObservationEvent>,
        rx: Receiver<ObservationEvent>,
        metrics: Arc<IngestionMetrics>,
    ) {
        let source_id = self.source_id.clone();
        let drop_policy = self.config.drop_policy;

        self.source.listen(Arc::new(move |event| {
            metrics.record_received();
            metrics.update_queue_len(tx.len());

            match tx.try_send(event) {
                Ok(()) => {
                    trace!(source_id = %source_id, "event forwarded");
                }
                Err(TrySendError::Full(event)) => match drop_policy {
                    DropPolicy::DropNewest => {
                        metrics.record_dropped();
                        warn!(source_id = %source_id, "channel full, event dropped");
                    }
                    DropPolicy::DropOldest => {
                        // Evict the head to make room for the fresh event.
                        let _ = rx.try_recv();
                        metrics.record_dropped();
                        if tx.try_send(event).is_err() {
                            warn!(source_id = %source_id, "channel full after eviction");
                        }
                    }
                },
                Err(TrySendError::Closed(_)) => {
                    debug!(source_id = %source_id, "event channel closed");
                }
            }
        }));
    }

    /// Stop the underlying feed.
    pub fn stop(&self) {
        self.source.stop();
    }

    /// Whether the underlying feed is listening.
    pub fn is_listening(&self) -> bool {
        self.source.is_listening()
    }
}
