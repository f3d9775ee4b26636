//! EpochBundle - Aggregation engine output
//!
//! Complete per-epoch measurement snapshot.

use serde::{Deserialize, Serialize};

use crate::{AgentId, ControlObservation, PoseObservation, RangeObservation};

/// Complete measurement snapshot for one epoch.
///
/// Emitted only when every expected observation has been collected: at least
/// one direction per relevant range edge, one pose and one control per
/// neighbor. Lists for poses and controls are aligned to the ego agent's
/// sorted neighbor order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochBundle {
    /// Ego agent this bundle was aggregated for
    pub agent: AgentId,

    /// Epoch sequence number (monotonically increasing)
    pub epoch_id: u64,

    /// Emission timestamp (seconds, f64), stamped at tick time
    pub timestamp: f64,

    /// One range entry per relevant edge
    pub ranges: Vec<RangeObservation>,

    /// One pose per neighbor, neighbor-index-aligned
    pub poses: Vec<PoseObservation>,

    /// One control per neighbor, neighbor-index-aligned
    pub controls: Vec<ControlObservation>,

    /// Epoch diagnostics
    pub meta: EpochMeta,
}

/// Diagnostics collected over one epoch, embedded in every bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpochMeta {
    /// Number of relevant range edges for this agent
    pub expected_ranges: usize,

    /// Range edges with at least one direction observed
    pub filled_ranges: usize,

    /// Neighbor count (size of each positional slot list)
    pub neighbor_count: usize,

    /// Filled pose slots
    pub filled_poses: usize,

    /// Filled control slots
    pub filled_controls: usize,

    /// Observations dropped for an unknown external identifier
    pub dropped_unknown_id: u32,

    /// Range observations dropped for an unrecognized edge
    pub dropped_unrecognized_edge: u32,

    /// Slot overwrites within the epoch (last-write-wins)
    pub overwrites: u32,
}
