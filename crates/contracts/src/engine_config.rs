//! Aggregation engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::AgentId;

/// Aggregation engine configuration
///
/// Plain values handed to the core at startup; the engine never touches
/// configuration files itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ego agent (the agent this engine instance aggregates for)
    pub ego: AgentId,

    /// Tick frequency in Hz
    pub frequency_hz: f64,

    /// Total agent count in the fleet
    pub num_agents: u32,

    /// Global per-agent adjacency specification
    pub adjacency: BTreeMap<AgentId, Vec<AgentId>>,

    /// External wire identifier -> internal agent id
    pub identity: HashMap<u32, AgentId>,
}

impl EngineConfig {
    /// Tick period derived from the configured frequency.
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.frequency_hz)
    }
}
