//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Observation timestamps are seconds (f64) on the shared fleet clock
//! - `epoch_id` is a per-agent monotonic counter, used for ordering/diagnostics

mod agent_id;
mod blueprint;
mod bundle;
mod engine_config;
mod error;
mod observation;
mod sink;
mod source;

pub use agent_id::AgentId;
pub use blueprint::*;
pub use bundle::*;
pub use engine_config::*;
pub use error::*;
pub use observation::*;
pub use sink::*;
pub use source::{ObservationCallback, ObservationSource};
