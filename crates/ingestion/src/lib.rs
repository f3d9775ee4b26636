//! Observation ingestion
//!
//! Bridges push-style observation feeds onto a bounded async channel that
//! the aggregation loop drains. Each feed registers a callback with its
//! source; the adapter forwards events into the shared channel and applies
//! the configured backpressure policy when the channel is full.
//!
//! # Example
//!
//! ```no_run
//! use ingestion::{IngestionPipeline, MockObservationSource};
//!
//! # async fn example() {
//! let mut pipeline = IngestionPipeline::new(100);
//! pipeline.register_source(
//!     "ranges".to_string(),
//!     Box::new(MockObservationSource::range_feed("ranges", 50.0, vec![(101, 100)])),
//!     None,
//! );
//!
//! let rx = pipeline.start().expect("receiver already taken");
//! while let Ok(event) = rx.recv().await {
//!     // feed into the aggregation engine
//!     let _ = event;
//! }
//! # }
//! ```

mod adapter;
mod config;
mod mock;
mod pipeline;

pub use adapter::FeedAdapter;
pub use config::{BackpressureConfig, IngestionMetrics, MetricsSnapshot};
pub use mock::{MockFeedConfig, MockFeedKind, MockObservationSource};
pub use pipeline::IngestionPipeline;

pub use contracts::{DropPolicy, ObservationCallback, ObservationEvent, ObservationSource};
