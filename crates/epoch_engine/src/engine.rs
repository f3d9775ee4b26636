//! Main aggregation engine implementation.

use contracts::{
    AgentId, ContractError, ControlObservation, EngineConfig, EpochBundle, ObservationEvent,
    PoseObservation, RangeObservation, RawControlObservation, RawRangeObservation,
};
use tracing::{debug, instrument, trace, warn};

use crate::buffer::{EpochBuffer, FillCounts};
use crate::graph::ConnectivityGraph;
use crate::identity::IdentityMap;

/// Per-agent epoch aggregation engine.
///
/// Single logical state (collecting); a tick on a complete buffer takes the
/// bundle and returns to collecting with a freshly reset buffer. There is no
/// terminal state short of process shutdown.
///
/// The engine is deliberately synchronous and single-owner: all ingress and
/// the periodic tick must be routed through one task (or otherwise mutually
/// excluded) so that the snapshot-then-reset on emission is observed
/// atomically by subsequent writes.
#[derive(Debug)]
pub struct AggregationEngine {
    /// Ego agent
    ego: AgentId,
    /// Pruned connectivity graph (ego's relevant edge set)
    graph: ConnectivityGraph,
    /// External-to-internal identifier table
    identity: IdentityMap,
    /// Sorted ego neighborhood
    neighbors: Vec<AgentId>,
    /// Slot storage for the in-progress epoch
    buffer: EpochBuffer,
    /// Epochs emitted so far
    epoch_counter: u64,
    /// Observations dropped for an unknown external id, current epoch
    dropped_unknown_id: u32,
    /// Range observations dropped for an unrecognized edge, current epoch
    dropped_unrecognized_edge: u32,
}

impl AggregationEngine {
    /// Construct the engine from startup configuration.
    ///
    /// # Errors
    /// `ConfigValidation` when the ego agent is absent from the adjacency
    /// specification or no external id maps to it; both are fatal because the
    /// engine cannot know what to wait for.
    pub fn new(config: &EngineConfig) -> Result<Self, ContractError> {
        let identity = IdentityMap::new(config.identity.clone());
        if !identity.maps_to(config.ego) {
            return Err(ContractError::config_validation(
                "identity",
                format!("no external id maps to ego agent {}", config.ego.get()),
            ));
        }

        let full = ConnectivityGraph::build(&config.adjacency);
        let graph = full.prune(config.ego)?;
        let neighbors = graph
            .neighbors(config.ego)
            .expect("pruned graph retains the ego entry")
            .to_vec();

        let buffer = EpochBuffer::new(&graph, neighbors.clone());

        Ok(Self {
            ego: config.ego,
            graph,
            identity,
            neighbors,
            buffer,
            epoch_counter: 0,
            dropped_unknown_id: 0,
            dropped_unrecognized_edge: 0,
        })
    }

    /// Route one inbound event to its handler.
    pub fn handle_event(&mut self, event: ObservationEvent) {
        match event {
            ObservationEvent::Range(raw) => self.handle_range(raw),
            ObservationEvent::Pose {
                neighbor_index,
                pose,
            } => self.handle_pose(neighbor_index, pose),
            ObservationEvent::Control(raw) => self.handle_control(raw),
        }
    }

    /// Ingest a range observation from the shared ranging feed.
    ///
    /// Translate both endpoints, validate the directed pair against the
    /// pruned graph, record. Failures drop the observation and count it.
    #[instrument(
        level = "trace",
        name = "engine_handle_range",
        skip(self, raw),
        fields(from_id = raw.from_id, to_id = raw.to_id)
    )]
    pub fn handle_range(&mut self, raw: RawRangeObservation) {
        let (from, to) = match (
            self.identity.translate(raw.from_id),
            self.identity.translate(raw.to_id),
        ) {
            (Ok(from), Ok(to)) => (from, to),
            _ => {
                self.dropped_unknown_id += 1;
                metrics::counter!("fleet_epoch_dropped_total", "reason" => "unknown_id")
                    .increment(1);
                trace!(from_id = raw.from_id, to_id = raw.to_id, "range dropped, unknown id");
                return;
            }
        };

        let observation = RangeObservation {
            from,
            to,
            distance: raw.distance,
            timestamp: raw.timestamp,
        };

        if self.buffer.record_range(observation) {
            metrics::counter!("fleet_epoch_observations_total", "kind" => "range").increment(1);
        } else {
            self.dropped_unrecognized_edge += 1;
            metrics::counter!("fleet_epoch_dropped_total", "reason" => "unrecognized_edge")
                .increment(1);
            trace!(%from, %to, "range dropped, not a relevant edge");
        }
    }

    /// Ingest a pose observation from the per-neighbor pose feed.
    ///
    /// The feed-to-index binding is established at startup; an out-of-range
    /// index means a miswired feed and is worth a warning.
    #[instrument(
        level = "trace",
        name = "engine_handle_pose",
        skip(self, pose),
        fields(neighbor_index)
    )]
    pub fn handle_pose(&mut self, neighbor_index: usize, pose: PoseObservation) {
        if self.buffer.record_pose(neighbor_index, pose) {
            metrics::counter!("fleet_epoch_observations_total", "kind" => "pose").increment(1);
        } else {
            warn!(
                neighbor_index,
                neighbors = self.neighbors.len(),
                "pose dropped, neighbor index out of range"
            );
            metrics::counter!("fleet_epoch_dropped_total", "reason" => "bad_index").increment(1);
        }
    }

    /// Ingest a control observation from the shared control feed.
    ///
    /// Only entries whose translated id is one of the ego's neighbors are
    /// retained; everything else on the shared feed is silently dropped.
    #[instrument(
        level = "trace",
        name = "engine_handle_control",
        skip(self, raw),
        fields(car_id = raw.car_id)
    )]
    pub fn handle_control(&mut self, raw: RawControlObservation) {
        let agent = match self.identity.translate(raw.car_id) {
            Ok(agent) => agent,
            Err(_) => {
                self.dropped_unknown_id += 1;
                metrics::counter!("fleet_epoch_dropped_total", "reason" => "unknown_id")
                    .increment(1);
                trace!(car_id = raw.car_id, "control dropped, unknown id");
                return;
            }
        };

        let Ok(neighbor_index) = self.neighbors.binary_search(&agent) else {
            trace!(%agent, "control dropped, not a neighbor");
            metrics::counter!("fleet_epoch_dropped_total", "reason" => "not_a_neighbor")
                .increment(1);
            return;
        };

        let observation = ControlObservation {
            agent,
            velocity: raw.velocity,
            steering: raw.steering,
            timestamp: raw.timestamp,
        };

        if self.buffer.record_control(neighbor_index, observation) {
            metrics::counter!("fleet_epoch_observations_total", "kind" => "control").increment(1);
        }
    }

    /// Run one periodic tick.
    ///
    /// On a complete buffer: take a bundle stamped with `now`, reset every
    /// slot, and return the bundle. Otherwise report diagnostic fill counts
    /// and change nothing; the same epoch keeps accumulating. Repeated ticks
    /// with no new input are idempotent.
    #[instrument(name = "engine_tick", skip(self), fields(now))]
    pub fn tick(&mut self, now: f64) -> Option<EpochBundle> {
        if !self.buffer.is_complete() {
            let counts = self.fill_counts();
            debug!(
                agent = %self.ego,
                ranges = counts.ranges,
                expected_ranges = counts.expected_ranges,
                poses = counts.poses,
                controls = counts.controls,
                neighbors = counts.neighbors,
                "epoch incomplete, waiting"
            );
            metrics::gauge!("fleet_epoch_filled_ranges").set(counts.ranges as f64);
            metrics::gauge!("fleet_epoch_filled_poses").set(counts.poses as f64);
            metrics::gauge!("fleet_epoch_filled_controls").set(counts.controls as f64);
            return None;
        }

        let epoch_id = self.epoch_counter + 1;
        let mut bundle = self
            .buffer
            .take(self.ego, epoch_id, now)
            .expect("buffer complete at take time");

        bundle.meta.dropped_unknown_id = self.dropped_unknown_id;
        bundle.meta.dropped_unrecognized_edge = self.dropped_unrecognized_edge;

        self.epoch_counter = epoch_id;
        self.dropped_unknown_id = 0;
        self.dropped_unrecognized_edge = 0;

        metrics::counter!("fleet_epoch_epochs_total").increment(1);
        debug!(
            agent = %self.ego,
            epoch_id,
            ranges = bundle.ranges.len(),
            "epoch complete, bundle emitted"
        );

        Some(bundle)
    }

    /// Current fill counts (diagnostics).
    pub fn fill_counts(&self) -> FillCounts {
        self.buffer.fill_counts()
    }

    /// Sorted ego neighborhood.
    pub fn neighbors(&self) -> &[AgentId] {
        &self.neighbors
    }

    /// Relevant unordered range pairs for this agent.
    pub fn expected_pairs(&self) -> &[(AgentId, AgentId)] {
        self.buffer.expected_pairs()
    }

    /// Pruned connectivity graph.
    pub fn graph(&self) -> &ConnectivityGraph {
        &self.graph
    }

    /// Epochs emitted so far.
    pub fn epoch_count(&self) -> u64 {
        self.epoch_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;
    use std::collections::{BTreeMap, HashMap};

    /// 3 agents: ego 0 with neighbors {1, 2}, expected pairs {0-1, 0-2}.
    /// External ids 100/101/102 map to 0/1/2.
    fn config() -> EngineConfig {
        EngineConfig {
            ego: AgentId::new(0),
            frequency_hz: 20.0,
            num_agents: 3,
            adjacency: BTreeMap::from([
                (AgentId::new(0), vec![AgentId::new(1), AgentId::new(2)]),
                (AgentId::new(1), vec![AgentId::new(0)]),
                (AgentId::new(2), vec![AgentId::new(0)]),
            ]),
            identity: HashMap::from([
                (100, AgentId::new(0)),
                (101, AgentId::new(1)),
                (102, AgentId::new(2)),
            ]),
        }
    }

    fn raw_range(from_id: u32, to_id: u32, distance: f64) -> RawRangeObservation {
        RawRangeObservation {
            from_id,
            to_id,
            distance,
            timestamp: 0.1,
        }
    }

    fn raw_control(car_id: u32) -> RawControlObservation {
        RawControlObservation {
            car_id,
            velocity: 1.5,
            steering: 0.1,
            timestamp: 0.1,
        }
    }

    fn pose() -> PoseObservation {
        PoseObservation {
            position: Vector3 {
                x: 1.0,
                y: 2.0,
                z: 0.0,
            },
            orientation: Default::default(),
            covariance: vec![0.0; 36],
            timestamp: 0.1,
        }
    }

    fn fill(engine: &mut AggregationEngine) {
        engine.handle_range(raw_range(101, 100, 5.0));
        engine.handle_range(raw_range(100, 102, 3.2));
        engine.handle_pose(0, pose());
        engine.handle_pose(1, pose());
        engine.handle_control(raw_control(101));
        engine.handle_control(raw_control(102));
    }

    #[test]
    fn test_construction() {
        let engine = AggregationEngine::new(&config()).unwrap();
        assert_eq!(engine.neighbors(), &[AgentId::new(1), AgentId::new(2)]);
        assert_eq!(engine.expected_pairs().len(), 2);
    }

    #[test]
    fn test_fully_connected_triangle_waits_only_on_ego_pairs() {
        // Global edges {0-1, 0-2, 1-2}; agent 0 never sees the 1-2 range,
        // so it must not gate epoch completion on it.
        let mut config = config();
        config
            .adjacency
            .insert(AgentId::new(1), vec![AgentId::new(0), AgentId::new(2)]);
        config
            .adjacency
            .insert(AgentId::new(2), vec![AgentId::new(0), AgentId::new(1)]);

        let mut engine = AggregationEngine::new(&config).unwrap();
        assert_eq!(
            engine.expected_pairs(),
            &[
                (AgentId::new(0), AgentId::new(1)),
                (AgentId::new(0), AgentId::new(2)),
            ]
        );

        fill(&mut engine);
        let bundle = engine.tick(0.2).expect("ego pairs filled, epoch complete");
        assert_eq!(bundle.ranges.len(), 2);

        // A 1-2 range on the shared feed is not a relevant edge here.
        let mut engine = AggregationEngine::new(&config).unwrap();
        engine.handle_range(raw_range(101, 102, 4.0));
        assert_eq!(engine.fill_counts().ranges, 0);
    }

    #[test]
    fn test_construction_fails_without_ego_adjacency() {
        let mut config = config();
        config.adjacency.remove(&AgentId::new(0));
        let result = AggregationEngine::new(&config);
        assert!(matches!(
            result,
            Err(ContractError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_construction_fails_without_ego_identity() {
        let mut config = config();
        config.identity.remove(&100);
        let result = AggregationEngine::new(&config);
        assert!(matches!(
            result,
            Err(ContractError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_complete_epoch_emits_once() {
        let mut engine = AggregationEngine::new(&config()).unwrap();
        fill(&mut engine);

        let bundle = engine.tick(0.2).expect("complete epoch must emit");
        assert_eq!(bundle.epoch_id, 1);
        assert_eq!(bundle.timestamp, 0.2);
        assert_eq!(bundle.ranges.len(), 2);
        assert_eq!(bundle.poses.len(), 2);
        assert_eq!(bundle.controls.len(), 2);

        // A subsequent tick with no new input emits nothing.
        assert!(engine.tick(0.25).is_none());
        assert_eq!(engine.epoch_count(), 1);
    }

    #[test]
    fn test_incomplete_tick_is_idempotent() {
        let mut engine = AggregationEngine::new(&config()).unwrap();
        engine.handle_range(raw_range(101, 100, 5.0));

        let before = engine.fill_counts();
        assert!(engine.tick(0.2).is_none());
        assert!(engine.tick(0.3).is_none());
        assert_eq!(engine.fill_counts(), before);
        assert_eq!(engine.epoch_count(), 0);
    }

    #[test]
    fn test_unknown_identifier_dropped() {
        let mut engine = AggregationEngine::new(&config()).unwrap();
        fill(&mut engine);

        // External id 9 has no table entry; epoch completeness is unaffected.
        engine.handle_range(raw_range(9, 100, 7.0));

        let bundle = engine.tick(0.2).unwrap();
        assert_eq!(bundle.ranges.len(), 2);
        assert_eq!(bundle.meta.dropped_unknown_id, 1);
    }

    #[test]
    fn test_non_neighbor_control_dropped() {
        let mut engine = AggregationEngine::new(&config()).unwrap();
        // Ego's own control is not a neighbor slot.
        engine.handle_control(raw_control(100));
        assert_eq!(engine.fill_counts().controls, 0);
    }

    #[test]
    fn test_no_cross_epoch_leakage() {
        let mut engine = AggregationEngine::new(&config()).unwrap();
        fill(&mut engine);
        engine.tick(0.2).unwrap();

        // Epoch 2 starts from scratch; one range alone does not complete it.
        engine.handle_range(raw_range(101, 100, 6.0));
        assert!(engine.tick(0.3).is_none());

        let counts = engine.fill_counts();
        assert_eq!(counts.ranges, 1);
        assert_eq!(counts.poses, 0);
        assert_eq!(counts.controls, 0);
    }

    #[test]
    fn test_drop_counters_reset_after_emission() {
        let mut engine = AggregationEngine::new(&config()).unwrap();
        fill(&mut engine);
        engine.handle_range(raw_range(9, 100, 7.0));
        engine.tick(0.2).unwrap();

        fill(&mut engine);
        let bundle = engine.tick(0.3).unwrap();
        assert_eq!(bundle.meta.dropped_unknown_id, 0);
    }
}
