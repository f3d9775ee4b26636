//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(agent_id) = args.agent_id {
        info!(agent_id, "Overriding ego agent id from CLI");
        blueprint.agent.id = agent_id;
    }
    if let Some(frequency) = args.frequency {
        info!(frequency_hz = frequency, "Overriding frequency from CLI");
        blueprint.agent.frequency_hz = frequency;
    }

    info!(
        agent = blueprint.agent.id,
        frequency_hz = blueprint.agent.frequency_hz,
        num_agents = blueprint.agent.num_agents,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        max_epochs: if args.max_epochs == 0 {
            None
        } else {
            Some(args.max_epochs)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    // Run pipeline with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        epochs_emitted = stats.epochs_emitted,
                        observations_received = stats.observations_received,
                        duration_secs = stats.duration.as_secs_f64(),
                        eps = format!("{:.2}", stats.eps()),
                        "Pipeline completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(CliError::pipeline_execution(format!("{e:#}")).into());
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Fleet Epoch finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::AgentBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Agent:");
    println!("  Ego id: {}", blueprint.agent.id);
    println!("  Frequency: {} Hz", blueprint.agent.frequency_hz);
    println!("  Fleet size: {}", blueprint.agent.num_agents);

    let mut entries: Vec<_> = blueprint.adjacency.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    println!("\nAdjacency ({}):", entries.len());
    for (agent, neighbors) in entries {
        println!("  - agent {} -> {:?}", agent, neighbors);
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
