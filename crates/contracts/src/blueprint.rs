//! AgentBlueprint - Config Loader output
//!
//! Describes the full per-agent configuration: tick rate, fleet size,
//! identity table, connectivity topology, and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ContractError, EngineConfig};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete per-agent configuration blueprint.
///
/// Map sections are keyed by strings because that is what TOML/JSON give us;
/// [`AgentBlueprint::engine_config`] parses them into the typed form the
/// aggregation engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Ego agent settings
    pub agent: AgentSettings,

    /// External wire identifier -> internal agent id
    pub identity: HashMap<String, u32>,

    /// Per-agent neighbor lists (global, shared across the fleet)
    pub adjacency: HashMap<String, Vec<u32>>,

    /// Output routing configuration
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Ego agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// This agent's internal identifier
    pub id: u32,

    /// Tick frequency in Hz
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,

    /// Total agent count in the fleet
    pub num_agents: u32,
}

fn default_frequency_hz() -> f64 {
    20.0
}

impl AgentBlueprint {
    /// Build the typed engine configuration from the string-keyed sections.
    ///
    /// # Errors
    /// `ConfigValidation` if a map key does not parse as an agent id. The
    /// deeper semantic checks (ego present, ids in range, ...) live in the
    /// config_loader validator; this only does the type conversion.
    pub fn engine_config(&self) -> Result<EngineConfig, ContractError> {
        let mut adjacency = std::collections::BTreeMap::new();
        for (key, neighbors) in &self.adjacency {
            let id = parse_agent_key("adjacency", key)?;
            adjacency.insert(id, neighbors.iter().copied().map(Into::into).collect());
        }

        let mut identity = HashMap::with_capacity(self.identity.len());
        for (key, internal) in &self.identity {
            let external: u32 = key.parse().map_err(|_| {
                ContractError::config_validation(
                    format!("identity[{key}]"),
                    "key is not a valid external identifier",
                )
            })?;
            identity.insert(external, (*internal).into());
        }

        Ok(EngineConfig {
            ego: self.agent.id.into(),
            frequency_hz: self.agent.frequency_hz,
            num_agents: self.agent.num_agents,
            adjacency,
            identity,
        })
    }
}

fn parse_agent_key(section: &str, key: &str) -> Result<crate::AgentId, ContractError> {
    key.parse::<u32>().map(Into::into).map_err(|_| {
        ContractError::config_validation(
            format!("{section}[{key}]"),
            "key is not a valid agent id",
        )
    })
}

/// Sink kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log bundle summaries via tracing
    Log,
    /// Write bundles to disk
    File,
    /// Stream bundles over UDP
    Network,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Unique sink name
    pub name: String,

    /// Sink kind
    pub sink_type: SinkType,

    /// Worker queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Sink-specific parameters (base_path, addr, format, ...)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AgentId;

    fn blueprint() -> AgentBlueprint {
        AgentBlueprint {
            version: ConfigVersion::V1,
            agent: AgentSettings {
                id: 0,
                frequency_hz: 20.0,
                num_agents: 3,
            },
            identity: HashMap::from([
                ("100".to_string(), 0),
                ("101".to_string(), 1),
                ("102".to_string(), 2),
            ]),
            adjacency: HashMap::from([
                ("0".to_string(), vec![1, 2]),
                ("1".to_string(), vec![0, 2]),
                ("2".to_string(), vec![0, 1]),
            ]),
            sinks: vec![],
        }
    }

    #[test]
    fn test_engine_config_conversion() {
        let config = blueprint().engine_config().unwrap();
        assert_eq!(config.ego, AgentId::new(0));
        assert_eq!(config.identity.get(&101), Some(&AgentId::new(1)));
        assert_eq!(
            config.adjacency.get(&AgentId::new(0)),
            Some(&vec![AgentId::new(1), AgentId::new(2)])
        );
    }

    #[test]
    fn test_engine_config_bad_key() {
        let mut bp = blueprint();
        bp.adjacency.insert("car0".to_string(), vec![1]);
        let err = bp.engine_config().unwrap_err();
        assert!(err.to_string().contains("adjacency[car0]"));
    }
}
