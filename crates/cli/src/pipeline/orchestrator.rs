//! Pipeline orchestrator - coordinates all components.
//!
//! Wires mock observation feeds through ingestion into the aggregation
//! engine, and dispatches each completed epoch bundle to the sinks. The
//! engine is owned by a single loop, so no slot is ever touched
//! concurrently with the tick.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{AgentBlueprint, AgentId, EpochBundle, ObservationEvent};
use epoch_engine::AggregationEngine;
use ingestion::{IngestionPipeline, MockObservationSource};
use observability::{
    record_epoch_latency_ms, record_epoch_metrics, record_incomplete_tick,
    record_observation_received,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::PipelineStats;

/// Observation feeds run faster than the epoch tick so that slots
/// fill up between emissions.
const FEED_RATE_MULTIPLIER: f64 = 4.0;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The agent blueprint configuration
    pub blueprint: AgentBlueprint,

    /// Maximum number of epochs to emit (None = unlimited)
    pub max_epochs: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Build the engine from configuration
        let engine_config = blueprint
            .engine_config()
            .context("Failed to derive engine configuration")?;

        let mut engine = AggregationEngine::new(&engine_config)
            .context("Failed to construct aggregation engine")?;

        info!(
            ego = %engine_config.ego,
            neighbors = engine.neighbors().len(),
            expected_pairs = engine.expected_pairs().len(),
            frequency_hz = engine_config.frequency_hz,
            "Aggregation engine configured"
        );

        // Setup Ingestion Pipeline with mock feeds
        info!("Setting up ingestion pipeline...");
        let mut ingestion = IngestionPipeline::new(self.config.buffer_size);

        // Internal ids back to the external ids the feeds speak
        let external: HashMap<AgentId, u32> = engine_config
            .identity
            .iter()
            .map(|(ext, internal)| (*internal, *ext))
            .collect();

        let feed_hz = engine_config.frequency_hz * FEED_RATE_MULTIPLIER;
        let active_feeds = register_mock_feeds(&mut ingestion, &engine, &external, feed_hz);

        info!(active_feeds, "Ingestion pipeline configured");

        // Setup Dispatcher
        info!("Setting up dispatcher...");
        let (bundle_tx, bundle_rx) = mpsc::channel::<EpochBundle>(self.config.buffer_size);

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - epoch bundles will be dropped");
        }

        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), bundle_rx)
            .await
            .context("Failed to create dispatcher")?;

        let active_sinks = blueprint.sinks.len();
        let dispatcher_handle = dispatcher.spawn();

        info!(active_sinks, "Dispatcher started");

        // Start Pipeline
        info!("Starting observation ingestion...");
        let ingestion_rx = ingestion
            .start()
            .context("Failed to get ingestion receiver")?;

        let max_epochs = self.config.max_epochs;
        let tick_period = engine_config.tick_period();

        info!(max_epochs = ?max_epochs, tick_ms = tick_period.as_millis() as u64, "Pipeline running");

        // Aggregation loop: drains observations and ticks the engine
        let pipeline_task = async move {
            let mut stats = PipelineStats {
                active_feeds,
                active_sinks,
                ..Default::default()
            };

            let mut interval = tokio::time::interval(tick_period);

            loop {
                tokio::select! {
                    event = ingestion_rx.recv() => {
                        match event {
                            Ok(event) => {
                                stats.observations_received += 1;
                                record_observation_received("ingestion", event_kind(&event));
                                engine.handle_event(event);
                            }
                            Err(_) => {
                                warn!("Ingestion channel closed");
                                break;
                            }
                        }
                    }
                    _ = interval.tick() => {
                        let now = start_time.elapsed().as_secs_f64();

                        let Some(bundle) = engine.tick(now) else {
                            stats.incomplete_ticks += 1;
                            let counts = engine.fill_counts();
                            record_incomplete_tick(counts.ranges, counts.poses, counts.controls);
                            continue;
                        };

                        stats.epochs_emitted += 1;
                        record_epoch_metrics(&bundle.meta, bundle.epoch_id);
                        stats.epoch_metrics.update(&bundle.meta, bundle.timestamp);

                        let oldest = bundle
                            .ranges
                            .iter()
                            .map(|r| r.timestamp)
                            .chain(bundle.poses.iter().map(|p| p.timestamp))
                            .chain(bundle.controls.iter().map(|c| c.timestamp))
                            .fold(f64::INFINITY, f64::min);
                        if oldest.is_finite() {
                            record_epoch_latency_ms((bundle.timestamp - oldest).max(0.0) * 1000.0);
                        }

                        info!(
                            epoch_id = bundle.epoch_id,
                            timestamp = format!("{:.3}", bundle.timestamp),
                            ranges = bundle.ranges.len(),
                            poses = bundle.poses.len(),
                            controls = bundle.controls.len(),
                            overwrites = bundle.meta.overwrites,
                            "Epoch bundle emitted"
                        );

                        if bundle_tx.send(bundle).await.is_err() {
                            warn!("Dispatcher channel closed");
                            break;
                        }

                        // Check max epochs limit
                        if let Some(max) = max_epochs {
                            if stats.epochs_emitted >= max {
                                info!(epochs = stats.epochs_emitted, "Reached max epochs limit");
                                break;
                            }
                        }
                    }
                }
            }

            stats
        };

        // Run with optional timeout
        let stats = if let Some(timeout) = self.config.timeout {
            match tokio::time::timeout(timeout, pipeline_task).await {
                Ok(stats) => stats,
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                    PipelineStats::default()
                }
            }
        } else {
            pipeline_task.await
        };

        // Shutdown
        info!("Shutting down pipeline...");
        ingestion.stop();

        // Wait for dispatcher to flush
        let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

        let mut final_stats = stats;
        final_stats.duration = start_time.elapsed();

        info!(
            duration_secs = final_stats.duration.as_secs_f64(),
            eps = format!("{:.2}", final_stats.eps()),
            "Pipeline shutdown complete"
        );

        Ok(final_stats)
    }
}

fn event_kind(event: &ObservationEvent) -> &'static str {
    match event {
        ObservationEvent::Range(_) => "range",
        ObservationEvent::Pose { .. } => "pose",
        ObservationEvent::Control(_) => "control",
    }
}

/// Register mock feeds mirroring the real deployment layout: one shared
/// ranging feed, one pose feed per neighbor, one shared control feed.
fn register_mock_feeds(
    ingestion: &mut IngestionPipeline,
    engine: &AggregationEngine,
    external: &HashMap<AgentId, u32>,
    feed_hz: f64,
) -> usize {
    let mut active_feeds = 0usize;

    // Ranging feed cycles through both directions of every expected pair
    let mut range_pairs = Vec::with_capacity(engine.expected_pairs().len() * 2);
    for (a, b) in engine.expected_pairs() {
        let (Some(&ext_a), Some(&ext_b)) = (external.get(a), external.get(b)) else {
            warn!(pair = ?(a, b), "No external ids for pair, skipping feed");
            continue;
        };
        range_pairs.push((ext_a, ext_b));
        range_pairs.push((ext_b, ext_a));
    }

    if !range_pairs.is_empty() {
        ingestion.register_source(
            "ranges".to_string(),
            Box::new(MockObservationSource::range_feed(
                "ranges", feed_hz, range_pairs,
            )),
            None,
        );
        active_feeds += 1;
    }

    // One pose feed per neighbor slot
    for (index, neighbor) in engine.neighbors().iter().enumerate() {
        let source_id = format!("pose_{}", neighbor);
        ingestion.register_source(
            source_id.clone(),
            Box::new(MockObservationSource::pose_feed(&source_id, feed_hz, index)),
            None,
        );
        active_feeds += 1;
    }

    // Control feed cycles through all neighbors
    let control_ids: Vec<u32> = engine
        .neighbors()
        .iter()
        .filter_map(|n| external.get(n).copied())
        .collect();

    if !control_ids.is_empty() {
        ingestion.register_source(
            "controls".to_string(),
            Box::new(MockObservationSource::control_feed(
                "controls",
                feed_hz,
                control_ids,
            )),
            None,
        );
        active_feeds += 1;
    }

    active_feeds
}
