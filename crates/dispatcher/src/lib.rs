//! # Dispatcher
//!
//! Fans completed epoch bundles out to configured sinks.
//!
//! Each sink runs on its own worker task with an isolated queue, so a
//! slow or failing sink never blocks the aggregation loop or its peers.

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{BundleSink, EpochBundle};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherConfig, create_dispatcher};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, LogSink, NetworkSink};
