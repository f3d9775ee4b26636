//! Mock Pipeline Demo
//!
//! Runs the full aggregation pipeline against mock observation feeds.
//! No external transport is required.
//!
//! Run with: cargo run --bin mock_pipeline [config.toml]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use config_loader::ConfigLoader;
use contracts::{AgentBlueprint, AgentId, AgentSettings, ConfigVersion, EpochBundle};
use epoch_engine::AggregationEngine;
use ingestion::{IngestionPipeline, MockObservationSource};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        // Create a minimal test blueprint
        create_test_blueprint()
    };

    // ==== Stage 2: Build the engine ====
    let engine_config = blueprint.engine_config()?;
    let mut engine = AggregationEngine::new(&engine_config)?;

    tracing::info!(
        ego = %engine_config.ego,
        neighbors = ?engine.neighbors(),
        expected_pairs = engine.expected_pairs().len(),
        "Aggregation engine configured"
    );

    // ==== Stage 3: Setup Ingestion Pipeline ====
    tracing::info!("Setting up ingestion pipeline...");
    let mut ingestion = IngestionPipeline::new(100);

    // Internal ids back to external feed ids
    let external: HashMap<AgentId, u32> = engine_config
        .identity
        .iter()
        .map(|(ext, internal)| (*internal, *ext))
        .collect();

    let feed_hz = engine_config.frequency_hz * 4.0;

    let mut range_pairs = Vec::new();
    for (a, b) in engine.expected_pairs() {
        range_pairs.push((external[a], external[b]));
        range_pairs.push((external[b], external[a]));
    }
    ingestion.register_source(
        "ranges".to_string(),
        Box::new(MockObservationSource::range_feed(
            "ranges", feed_hz, range_pairs,
        )),
        None,
    );

    for (index, neighbor) in engine.neighbors().iter().enumerate() {
        let source_id = format!("pose_{}", neighbor);
        ingestion.register_source(
            source_id.clone(),
            Box::new(MockObservationSource::pose_feed(&source_id, feed_hz, index)),
            None,
        );
    }

    let control_ids: Vec<u32> = engine.neighbors().iter().map(|n| external[n]).collect();
    ingestion.register_source(
        "controls".to_string(),
        Box::new(MockObservationSource::control_feed(
            "controls",
            feed_hz,
            control_ids,
        )),
        None,
    );

    tracing::info!(
        feed_count = ingestion.feed_count(),
        "Ingestion pipeline configured"
    );

    // ==== Stage 4: Setup Dispatcher ====
    let (bundle_tx, bundle_rx) = mpsc::channel::<EpochBundle>(100);
    let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), bundle_rx).await?;
    let dispatcher_handle = dispatcher.spawn();

    // ==== Stage 5: Start Pipeline ====
    tracing::info!("Starting pipeline...");
    let ingestion_rx = ingestion.start().unwrap();

    let target_epochs = 50u64;
    let tick_period = engine_config.tick_period();

    tracing::info!("Running pipeline, target: {} epoch bundles", target_epochs);

    let pipeline_handle = tokio::spawn(async move {
        let mut emitted = 0u64;
        let mut interval = tokio::time::interval(tick_period);
        let start = Instant::now();

        loop {
            tokio::select! {
                event = ingestion_rx.recv() => {
                    let Ok(event) = event else { break };
                    engine.handle_event(event);
                }
                _ = interval.tick() => {
                    let now = start.elapsed().as_secs_f64();
                    let Some(bundle) = engine.tick(now) else { continue };

                    emitted += 1;
                    tracing::info!(
                        epoch_id = bundle.epoch_id,
                        timestamp = format!("{:.3}", bundle.timestamp),
                        ranges = bundle.ranges.len(),
                        poses = bundle.poses.len(),
                        controls = bundle.controls.len(),
                        "Epoch bundle emitted"
                    );

                    if bundle_tx.send(bundle).await.is_err() {
                        break;
                    }
                    if emitted >= target_epochs {
                        break;
                    }
                }
            }
        }
        emitted
    });

    let emitted = tokio::time::timeout(Duration::from_secs(30), pipeline_handle).await??;

    // ==== Stage 6: Shutdown ====
    tracing::info!("Shutting down...");
    ingestion.stop();
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

    tracing::info!(epochs = emitted, "Mock pipeline demo finished");
    Ok(())
}

/// Minimal three-agent blueprint with a log sink
fn create_test_blueprint() -> AgentBlueprint {
    let mut identity = HashMap::new();
    identity.insert("100".to_string(), 0);
    identity.insert("101".to_string(), 1);
    identity.insert("102".to_string(), 2);

    let mut adjacency = HashMap::new();
    adjacency.insert("0".to_string(), vec![1, 2]);
    adjacency.insert("1".to_string(), vec![0]);
    adjacency.insert("2".to_string(), vec![0]);

    AgentBlueprint {
        version: ConfigVersion::V1,
        agent: AgentSettings {
            id: 0,
            frequency_hz: 20.0,
            num_agents: 3,
        },
        identity,
        adjacency,
        sinks: vec![contracts::SinkConfig {
            name: "log".to_string(),
            sink_type: contracts::SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }],
    }
}
