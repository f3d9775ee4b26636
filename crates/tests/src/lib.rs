//! # Integration Tests
//!
//! End-to-end tests covering the full pipeline without real transports:
//! mock feeds into ingestion, the aggregation engine, and the dispatcher.

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::{BTreeMap, HashMap};

    use contracts::{AgentId, EngineConfig, EpochBundle, SinkConfig, SinkType};
    use dispatcher::create_dispatcher;
    use epoch_engine::AggregationEngine;
    use ingestion::{IngestionPipeline, MockObservationSource};
    use tokio::sync::mpsc;

    /// Three-agent fleet seen from agent 0: neighbors 1 and 2, no 1-2 link.
    fn triangle_config() -> EngineConfig {
        let mut adjacency = BTreeMap::new();
        adjacency.insert(AgentId::new(0), vec![AgentId::new(1), AgentId::new(2)]);
        adjacency.insert(AgentId::new(1), vec![AgentId::new(0)]);
        adjacency.insert(AgentId::new(2), vec![AgentId::new(0)]);

        let mut identity = HashMap::new();
        identity.insert(100, AgentId::new(0));
        identity.insert(101, AgentId::new(1));
        identity.insert(102, AgentId::new(2));

        EngineConfig {
            ego: AgentId::new(0),
            frequency_hz: 20.0,
            num_agents: 3,
            adjacency,
            identity,
        }
    }

    /// End-to-end test: mock feeds -> ingestion -> engine -> dispatcher
    ///
    /// Verifies the full flow:
    /// 1. MockObservationSource generates ranging, pose, and control data
    /// 2. AggregationEngine fills slots and emits complete bundles on tick
    /// 3. Dispatcher fans EpochBundles out to sinks
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let config = triangle_config();
        let mut engine = AggregationEngine::new(&config).unwrap();

        // Feeds run well above the tick rate so every epoch completes
        let mut ingestion = IngestionPipeline::new(200);
        ingestion.register_source(
            "ranges".to_string(),
            Box::new(MockObservationSource::range_feed(
                "ranges",
                200.0,
                vec![(101, 100), (100, 102)],
            )),
            None,
        );
        ingestion.register_source(
            "pose_1".to_string(),
            Box::new(MockObservationSource::pose_feed("pose_1", 100.0, 0)),
            None,
        );
        ingestion.register_source(
            "pose_2".to_string(),
            Box::new(MockObservationSource::pose_feed("pose_2", 100.0, 1)),
            None,
        );
        ingestion.register_source(
            "controls".to_string(),
            Box::new(MockObservationSource::control_feed(
                "controls",
                200.0,
                vec![101, 102],
            )),
            None,
        );

        // Dispatcher with a log sink
        let (bundle_tx, bundle_rx) = mpsc::channel::<EpochBundle>(100);
        let sink_configs = vec![SinkConfig {
            name: "test_log".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }];

        let dispatcher = create_dispatcher(sink_configs, bundle_rx).await.unwrap();
        let dispatcher_handle = dispatcher.spawn();

        let ingestion_rx = ingestion.start().unwrap();

        let target_epochs = 3u64;

        let pipeline_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.tick_period());
            let mut observations = 0u64;
            let mut emitted = Vec::new();
            let start = std::time::Instant::now();

            loop {
                tokio::select! {
                    event = ingestion_rx.recv() => {
                        let Ok(event) = event else { break };
                        observations += 1;
                        engine.handle_event(event);
                    }
                    _ = interval.tick() => {
                        let now = start.elapsed().as_secs_f64();
                        if let Some(bundle) = engine.tick(now) {
                            emitted.push(bundle.clone());
                            if bundle_tx.send(bundle).await.is_err() {
                                break;
                            }
                            if emitted.len() as u64 >= target_epochs {
                                break;
                            }
                        }
                    }
                }
            }

            (observations, emitted)
        });

        let result =
            tokio::time::timeout(std::time::Duration::from_secs(5), pipeline_handle).await;

        ingestion.stop();

        // Wait for dispatcher to drain
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), dispatcher_handle).await;

        assert!(result.is_ok(), "Pipeline timed out");
        let (observations, emitted) = result.unwrap().unwrap();

        assert!(observations > 0, "Feeds should produce observations");
        assert!(
            emitted.len() as u64 >= target_epochs,
            "Should emit at least {} bundles, got {}",
            target_epochs,
            emitted.len()
        );

        // Every bundle is complete for agent 0's view of the fleet
        for bundle in &emitted {
            assert_eq!(bundle.agent, AgentId::new(0));
            assert_eq!(bundle.ranges.len(), 2);
            assert_eq!(bundle.poses.len(), 2);
            assert_eq!(bundle.controls.len(), 2);
        }

        // Epoch ids are dense and start at 1
        let ids: Vec<u64> = emitted.iter().map(|b| b.epoch_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    /// A feed that only covers one edge never lets an epoch complete.
    #[tokio::test]
    async fn test_e2e_partial_coverage_emits_nothing() {
        let config = triangle_config();
        let mut engine = AggregationEngine::new(&config).unwrap();

        let mut ingestion = IngestionPipeline::new(100);
        ingestion.register_source(
            "ranges".to_string(),
            Box::new(MockObservationSource::range_feed(
                "ranges",
                200.0,
                // Only the 0-1 edge, never 0-2
                vec![(101, 100)],
            )),
            None,
        );

        let ingestion_rx = ingestion.start().unwrap();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.tick_period());
            let mut emitted = 0u64;
            let start = std::time::Instant::now();

            for _ in 0..10 {
                tokio::select! {
                    event = ingestion_rx.recv() => {
                        let Ok(event) = event else { break };
                        engine.handle_event(event);
                    }
                    _ = interval.tick() => {
                        if engine.tick(start.elapsed().as_secs_f64()).is_some() {
                            emitted += 1;
                        }
                    }
                }
            }

            emitted
        });

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        ingestion.stop();

        assert!(result.is_ok(), "Test timed out");
        assert_eq!(result.unwrap().unwrap(), 0, "No epoch should complete");
    }

    /// Test dispatcher with multiple sink types
    #[tokio::test]
    async fn test_dispatcher_multiple_sinks() {
        let (tx, rx) = mpsc::channel::<EpochBundle>(10);

        let sink_configs = vec![
            SinkConfig {
                name: "log1".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "log2".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
        ];

        let dispatcher = create_dispatcher(sink_configs, rx).await.unwrap();

        // Check metrics before running
        let metrics = dispatcher.metrics();
        assert_eq!(metrics.len(), 2);

        let handle = dispatcher.spawn();

        // Send bundles
        for i in 0..5 {
            let bundle = EpochBundle {
                agent: AgentId::new(0),
                epoch_id: i,
                timestamp: i as f64 * 0.05,
                ranges: Vec::new(),
                poses: Vec::new(),
                controls: Vec::new(),
                meta: contracts::EpochMeta::default(),
            };
            tx.send(bundle).await.unwrap();
        }

        // Close channel
        drop(tx);

        // Wait for dispatcher
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), handle).await;
    }

    /// Config file parsed end to end into a working engine
    #[tokio::test]
    async fn test_config_to_engine() {
        let toml = r#"
            version = "V1"

            [agent]
            id = 0
            frequency_hz = 20.0
            num_agents = 3

            [identity]
            "100" = 0
            "101" = 1
            "102" = 2

            [adjacency]
            "0" = [1, 2]
            "1" = [0]
            "2" = [0]
        "#;

        let blueprint =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        let config = blueprint.engine_config().unwrap();
        let engine = AggregationEngine::new(&config).unwrap();

        assert_eq!(engine.neighbors(), &[AgentId::new(1), AgentId::new(2)]);
        assert_eq!(engine.expected_pairs().len(), 2);
    }
}
