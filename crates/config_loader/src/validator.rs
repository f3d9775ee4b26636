//! Configuration validation
//!
//! Rules:
//! - frequency_hz > 0, num_agents > 0
//! - adjacency/identity keys parse as integers, ids within num_agents
//! - ego agent present in both the adjacency spec and the identity table
//! - no self-edges, no duplicate identity targets
//! - sink names unique, required sink params present

use std::collections::HashSet;

use contracts::{AgentBlueprint, ContractError, SinkType};

/// Validate an AgentBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &AgentBlueprint) -> Result<(), ContractError> {
    validate_agent_settings(blueprint)?;
    validate_adjacency(blueprint)?;
    validate_identity(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_agent_settings(blueprint: &AgentBlueprint) -> Result<(), ContractError> {
    let agent = &blueprint.agent;

    if agent.frequency_hz <= 0.0 {
        return Err(ContractError::config_validation(
            "agent.frequency_hz",
            format!("frequency_hz must be > 0, got {}", agent.frequency_hz),
        ));
    }

    if agent.num_agents == 0 {
        return Err(ContractError::config_validation(
            "agent.num_agents",
            "num_agents must be > 0",
        ));
    }

    if agent.id >= agent.num_agents {
        return Err(ContractError::config_validation(
            "agent.id",
            format!(
                "agent id {} out of range for fleet of {}",
                agent.id, agent.num_agents
            ),
        ));
    }

    Ok(())
}

fn validate_adjacency(blueprint: &AgentBlueprint) -> Result<(), ContractError> {
    let num_agents = blueprint.agent.num_agents;
    let mut ego_seen = false;

    for (key, neighbors) in &blueprint.adjacency {
        let id: u32 = key.parse().map_err(|_| {
            ContractError::config_validation(
                format!("adjacency[{key}]"),
                "key is not a valid agent id",
            )
        })?;

        if id >= num_agents {
            return Err(ContractError::config_validation(
                format!("adjacency[{key}]"),
                format!("agent id {id} out of range for fleet of {num_agents}"),
            ));
        }

        if id == blueprint.agent.id {
            ego_seen = true;
        }

        for &neighbor in neighbors {
            if neighbor >= num_agents {
                return Err(ContractError::config_validation(
                    format!("adjacency[{key}]"),
                    format!("neighbor {neighbor} out of range for fleet of {num_agents}"),
                ));
            }
            if neighbor == id {
                return Err(ContractError::config_validation(
                    format!("adjacency[{key}]"),
                    "self-edges are not allowed",
                ));
            }
        }
    }

    // The agent cannot operate without its own neighbor list.
    if !ego_seen {
        return Err(ContractError::config_validation(
            "adjacency",
            format!("no entry for ego agent {}", blueprint.agent.id),
        ));
    }

    Ok(())
}

fn validate_identity(blueprint: &AgentBlueprint) -> Result<(), ContractError> {
    let num_agents = blueprint.agent.num_agents;
    let mut seen_internal = HashSet::new();
    let mut ego_seen = false;

    for (key, &internal) in &blueprint.identity {
        key.parse::<u32>().map_err(|_| {
            ContractError::config_validation(
                format!("identity[{key}]"),
                "key is not a valid external identifier",
            )
        })?;

        if internal >= num_agents {
            return Err(ContractError::config_validation(
                format!("identity[{key}]"),
                format!("internal id {internal} out of range for fleet of {num_agents}"),
            ));
        }

        if !seen_internal.insert(internal) {
            return Err(ContractError::config_validation(
                format!("identity[{key}]"),
                format!("duplicate internal id {internal}"),
            ));
        }

        if internal == blueprint.agent.id {
            ego_seen = true;
        }
    }

    if !ego_seen {
        return Err(ContractError::config_validation(
            "identity",
            format!("no external id maps to ego agent {}", blueprint.agent.id),
        ));
    }

    Ok(())
}

fn validate_sinks(blueprint: &AgentBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for sink in &blueprint.sinks {
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }

        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }

        // Network sinks cannot start without a target address.
        if sink.sink_type == SinkType::Network && !sink.params.contains_key("addr") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.addr", sink.name),
                "network sink requires an 'addr' parameter",
            ));
        }
    }
    Ok(())
}
