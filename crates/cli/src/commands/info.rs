//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    agent: AgentInfo,
    adjacency: Vec<AdjacencyInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    identity: Vec<IdentityInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct AgentInfo {
    id: u32,
    frequency_hz: f64,
    num_agents: u32,
}

#[derive(Serialize)]
struct AdjacencyInfo {
    agent: String,
    neighbors: Vec<u32>,
}

#[derive(Serialize)]
struct IdentityInfo {
    external: String,
    internal: u32,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::AgentBlueprint, args: &InfoArgs) -> ConfigInfo {
    let mut adjacency: Vec<AdjacencyInfo> = blueprint
        .adjacency
        .iter()
        .map(|(agent, neighbors)| AdjacencyInfo {
            agent: agent.clone(),
            neighbors: neighbors.clone(),
        })
        .collect();
    adjacency.sort_by(|a, b| a.agent.cmp(&b.agent));

    let identity = if args.identity {
        let mut rows: Vec<IdentityInfo> = blueprint
            .identity
            .iter()
            .map(|(external, internal)| IdentityInfo {
                external: external.clone(),
                internal: *internal,
            })
            .collect();
        rows.sort_by(|a, b| a.internal.cmp(&b.internal));
        rows
    } else {
        Vec::new()
    };

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        agent: AgentInfo {
            id: blueprint.agent.id,
            frequency_hz: blueprint.agent.frequency_hz,
            num_agents: blueprint.agent.num_agents,
        },
        adjacency,
        identity,
        sinks,
    }
}

fn print_config_info(blueprint: &contracts::AgentBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Fleet Epoch Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Agent info
    println!("🤖 Agent");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Ego id: {}", blueprint.agent.id);
    println!("   ├─ Frequency: {} Hz", blueprint.agent.frequency_hz);
    println!("   └─ Fleet size: {}", blueprint.agent.num_agents);

    // Adjacency
    let mut entries: Vec<_> = blueprint.adjacency.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    println!("\n🔗 Adjacency ({})", entries.len());
    for (i, (agent, neighbors)) in entries.iter().enumerate() {
        let is_last = i == entries.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        println!("   {} agent {} -> {:?}", prefix, agent, neighbors);
    }

    // Identity table
    if args.identity {
        let mut rows: Vec<_> = blueprint.identity.iter().collect();
        rows.sort_by(|a, b| a.1.cmp(b.1));

        println!("\n🪪 Identity ({})", rows.len());
        for (i, (external, internal)) in rows.iter().enumerate() {
            let is_last = i == rows.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {} -> agent {}", prefix, external, internal);
        }
    }

    // Sinks
    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
        }
    }

    println!();
}
