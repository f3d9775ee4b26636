//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    agent_id: u32,
    frequency_hz: f64,
    num_agents: u32,
    neighbor_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        let message = result
            .error
            .unwrap_or_else(|| "invalid configuration".to_string());
        Err(CliError::config_validation(message).into())
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let neighbor_count = blueprint
                .adjacency
                .get(&blueprint.agent.id.to_string())
                .map(|n| n.len())
                .unwrap_or(0);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    agent_id: blueprint.agent.id,
                    frequency_hz: blueprint.agent.frequency_hz,
                    num_agents: blueprint.agent.num_agents,
                    neighbor_count,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::AgentBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    // Check for empty sinks
    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - epoch bundles will be dropped".to_string());
    }

    // An isolated ego never completes an epoch with ranging slots,
    // but it is a legal (if useless) configuration
    let ego_neighbors = blueprint
        .adjacency
        .get(&blueprint.agent.id.to_string())
        .map(|n| n.len())
        .unwrap_or(0);
    if ego_neighbors == 0 {
        warnings.push(format!(
            "Agent {} has no neighbors - every epoch will be empty",
            blueprint.agent.id
        ));
    }

    // Unmapped agents can never contribute observations
    if (blueprint.identity.len() as u32) < blueprint.agent.num_agents {
        warnings.push(format!(
            "Identity map has {} entries for {} agents - unmapped observations will be dropped",
            blueprint.identity.len(),
            blueprint.agent.num_agents
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Agent: {}", summary.agent_id);
            println!("  Frequency: {} Hz", summary.frequency_hz);
            println!("  Fleet size: {}", summary.num_agents);
            println!("  Neighbors: {}", summary.neighbor_count);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
