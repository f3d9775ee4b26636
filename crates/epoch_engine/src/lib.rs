//! # Epoch Engine
//!
//! Per-agent epoch aggregation engine.
//!
//! Responsible for:
//! - Deriving the relevant edge set from the global connectivity topology
//! - Translating external wire identifiers to internal agent ids
//! - Buffering out-of-order, partial observations per epoch
//! - Emitting a complete `EpochBundle` and resetting on a periodic tick
//!
//! ## Usage
//!
//! ```ignore
//! use epoch_engine::AggregationEngine;
//!
//! let mut engine = AggregationEngine::new(&engine_config)?;
//!
//! // Feed events as they arrive
//! engine.handle_event(event);
//!
//! // Periodic tick
//! if let Some(bundle) = engine.tick(now) {
//!     // Publish the complete epoch bundle
//! }
//! ```

mod buffer;
mod engine;
mod graph;
mod identity;

pub use buffer::{EpochBuffer, FillCounts};
pub use engine::AggregationEngine;
pub use graph::ConnectivityGraph;
pub use identity::IdentityMap;

// Re-export contracts types
pub use contracts::{EngineConfig, EpochBundle, EpochMeta, ObservationEvent};
