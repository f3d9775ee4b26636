//! ObservationSource trait - inbound feed abstraction
//!
//! Defines a unified interface for observation feeds, decoupling the
//! ingestion pipeline from concrete transports. Mock feeds and real
//! transports share the same API.

use std::sync::Arc;

use crate::ObservationEvent;

/// Observation callback type
///
/// When a feed produces data, it sends an `ObservationEvent` through this
/// callback. Uses `Arc` to allow callback sharing across multiple contexts.
pub type ObservationCallback = Arc<dyn Fn(ObservationEvent) + Send + Sync>;

/// Observation feed trait
///
/// Abstracts the common behavior of real transports and mock feeds. All
/// inbound feeds implement this trait for use by the ingestion pipeline.
///
/// # Example
///
/// ```ignore
/// let feed: Box<dyn ObservationSource> = get_feed();
/// feed.listen(Arc::new(|event| {
///     println!("Received event: {:?}", event);
/// }));
/// // ... use feed ...
/// feed.stop();
/// ```
pub trait ObservationSource: Send + Sync {
    /// Get feed identifier
    fn source_id(&self) -> &str;

    /// Register data callback
    ///
    /// When the feed produces data, it calls the callback with an
    /// `ObservationEvent`. If already listening, repeated calls are
    /// idempotent (won't register multiple callbacks).
    fn listen(&self, callback: ObservationCallback);

    /// Stop listening
    ///
    /// Stops data generation. Mock feeds stop their background task; real
    /// transports unsubscribe.
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
