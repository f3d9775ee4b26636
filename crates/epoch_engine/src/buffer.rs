//! Per-epoch observation slots.
//!
//! Holds the mutable state for one in-progress epoch: one range slot per
//! relevant directed pair, one pose slot and one control slot per neighbor.
//! Slots are overwrite-only (last-write-wins) and reset together after a
//! successful emission.

use std::collections::HashMap;

use contracts::{
    AgentId, ControlObservation, EpochBundle, EpochMeta, PoseObservation, RangeObservation,
};

use crate::graph::ConnectivityGraph;

/// Diagnostic fill counts for an in-progress epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillCounts {
    /// Unordered range pairs with at least one direction observed
    pub ranges: usize,
    /// Total unordered range pairs expected
    pub expected_ranges: usize,
    /// Filled pose slots
    pub poses: usize,
    /// Filled control slots
    pub controls: usize,
    /// Neighbor count (pose and control slot count)
    pub neighbors: usize,
}

/// Slot storage for one epoch.
///
/// The slot layout (pairs and neighbor list) is fixed at construction and
/// never changes; only slot contents mutate.
#[derive(Debug)]
pub struct EpochBuffer {
    /// Sorted ego neighborhood; pose and control slots align to this order
    neighbors: Vec<AgentId>,
    /// Canonical unordered relevant edges, sorted
    pairs: Vec<(AgentId, AgentId)>,
    /// Directed range slots, two per unordered pair
    ranges: HashMap<(AgentId, AgentId), Option<RangeObservation>>,
    /// Pose slots, neighbor-index-aligned
    poses: Vec<Option<PoseObservation>>,
    /// Control slots, neighbor-index-aligned
    controls: Vec<Option<ControlObservation>>,
    /// Slot overwrites within the current epoch
    overwrites: u32,
}

impl EpochBuffer {
    /// Create a buffer for the ego's pruned graph, all slots unfilled.
    pub fn new(pruned: &ConnectivityGraph, neighbors: Vec<AgentId>) -> Self {
        let pairs: Vec<(AgentId, AgentId)> = pruned.edges().collect();

        let mut ranges = HashMap::with_capacity(pairs.len() * 2);
        for &(a, b) in &pairs {
            ranges.insert((a, b), None);
            ranges.insert((b, a), None);
        }

        let poses = vec![None; neighbors.len()];
        let controls = vec![None; neighbors.len()];

        Self {
            neighbors,
            pairs,
            ranges,
            poses,
            controls,
            overwrites: 0,
        }
    }

    /// Set every slot back to unfilled.
    pub fn reset(&mut self) {
        for slot in self.ranges.values_mut() {
            *slot = None;
        }
        self.poses.iter_mut().for_each(|slot| *slot = None);
        self.controls.iter_mut().for_each(|slot| *slot = None);
        self.overwrites = 0;
    }

    /// Record a range observation into its directed slot.
    ///
    /// Returns false if `(from, to)` is not a recognized directed pair; the
    /// observation is silently dropped in that case.
    pub fn record_range(&mut self, observation: RangeObservation) -> bool {
        let key = (observation.from, observation.to);
        match self.ranges.get_mut(&key) {
            Some(slot) => {
                if slot.is_some() {
                    self.overwrites += 1;
                }
                *slot = Some(observation);
                true
            }
            None => false,
        }
    }

    /// Record a pose observation by positional neighbor index.
    ///
    /// Returns false if the index is out of range.
    pub fn record_pose(&mut self, neighbor_index: usize, observation: PoseObservation) -> bool {
        match self.poses.get_mut(neighbor_index) {
            Some(slot) => {
                if slot.is_some() {
                    self.overwrites += 1;
                }
                *slot = Some(observation);
                true
            }
            None => false,
        }
    }

    /// Record a control observation by positional neighbor index.
    ///
    /// Returns false if the index is out of range.
    pub fn record_control(
        &mut self,
        neighbor_index: usize,
        observation: ControlObservation,
    ) -> bool {
        match self.controls.get_mut(neighbor_index) {
            Some(slot) => {
                if slot.is_some() {
                    self.overwrites += 1;
                }
                *slot = Some(observation);
                true
            }
            None => false,
        }
    }

    /// Evaluate epoch completeness from scratch.
    ///
    /// A range pair is satisfied by either direction being observed; pose and
    /// control slots must all be filled. No incremental counters are kept, so
    /// this can never desynchronize from actual slot state.
    pub fn is_complete(&self) -> bool {
        self.pairs.iter().all(|&pair| self.pair_filled(pair))
            && self.poses.iter().all(Option::is_some)
            && self.controls.iter().all(Option::is_some)
    }

    /// Current fill counts, for incomplete-tick diagnostics.
    pub fn fill_counts(&self) -> FillCounts {
        FillCounts {
            ranges: self
                .pairs
                .iter()
                .filter(|&&pair| self.pair_filled(pair))
                .count(),
            expected_ranges: self.pairs.len(),
            poses: self.poses.iter().filter(|slot| slot.is_some()).count(),
            controls: self.controls.iter().filter(|slot| slot.is_some()).count(),
            neighbors: self.neighbors.len(),
        }
    }

    /// Materialize the current slots into an immutable bundle.
    ///
    /// Returns `None` unless the epoch is complete. Does not mutate state;
    /// use [`EpochBuffer::take`] for the atomic snapshot-then-reset.
    pub fn snapshot(&self, agent: AgentId, epoch_id: u64, timestamp: f64) -> Option<EpochBundle> {
        if !self.is_complete() {
            return None;
        }

        let ranges = self
            .pairs
            .iter()
            .map(|&pair| self.select_range(pair))
            .collect();

        let poses = self.poses.iter().flatten().cloned().collect();
        let controls = self.controls.iter().copied().flatten().collect();

        let counts = self.fill_counts();
        let meta = EpochMeta {
            expected_ranges: counts.expected_ranges,
            filled_ranges: counts.ranges,
            neighbor_count: counts.neighbors,
            filled_poses: counts.poses,
            filled_controls: counts.controls,
            overwrites: self.overwrites,
            ..Default::default()
        };

        Some(EpochBundle {
            agent,
            epoch_id,
            timestamp,
            ranges,
            poses,
            controls,
            meta,
        })
    }

    /// Atomic take: snapshot the complete epoch and reset every slot.
    ///
    /// Returns `None` (and changes nothing) when the epoch is incomplete.
    pub fn take(&mut self, agent: AgentId, epoch_id: u64, timestamp: f64) -> Option<EpochBundle> {
        let bundle = self.snapshot(agent, epoch_id, timestamp)?;
        self.reset();
        Some(bundle)
    }

    /// Sorted ego neighborhood.
    pub fn neighbors(&self) -> &[AgentId] {
        &self.neighbors
    }

    /// Expected unordered range pairs.
    pub fn expected_pairs(&self) -> &[(AgentId, AgentId)] {
        &self.pairs
    }

    fn pair_filled(&self, (a, b): (AgentId, AgentId)) -> bool {
        self.ranges.get(&(a, b)).is_some_and(Option::is_some)
            || self.ranges.get(&(b, a)).is_some_and(Option::is_some)
    }

    /// Pick the emitted observation for one unordered pair. Either direction
    /// satisfies the pair; when both report, the later timestamp wins.
    fn select_range(&self, (a, b): (AgentId, AgentId)) -> RangeObservation {
        let forward = self.ranges.get(&(a, b)).copied().flatten();
        let reverse = self.ranges.get(&(b, a)).copied().flatten();

        match (forward, reverse) {
            (Some(f), Some(r)) => {
                if f.timestamp >= r.timestamp {
                    f
                } else {
                    r
                }
            }
            (Some(f), None) => f,
            (None, Some(r)) => r,
            // snapshot() only runs on a complete buffer
            (None, None) => unreachable!("snapshot taken on incomplete pair"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ego_buffer() -> EpochBuffer {
        // Agent 0 with neighbors {1, 2}, edges {0-1, 0-2}.
        let adjacency: BTreeMap<AgentId, Vec<AgentId>> = BTreeMap::from([
            (AgentId::new(0), vec![AgentId::new(1), AgentId::new(2)]),
            (AgentId::new(1), vec![AgentId::new(0)]),
            (AgentId::new(2), vec![AgentId::new(0)]),
        ]);
        let pruned = ConnectivityGraph::build(&adjacency)
            .prune(AgentId::new(0))
            .unwrap();
        let neighbors = pruned.neighbors(AgentId::new(0)).unwrap().to_vec();
        EpochBuffer::new(&pruned, neighbors)
    }

    fn range(from: u32, to: u32, distance: f64, timestamp: f64) -> RangeObservation {
        RangeObservation {
            from: AgentId::new(from),
            to: AgentId::new(to),
            distance,
            timestamp,
        }
    }

    fn control(agent: u32, timestamp: f64) -> ControlObservation {
        ControlObservation {
            agent: AgentId::new(agent),
            velocity: 1.0,
            steering: 0.0,
            timestamp,
        }
    }

    fn fill(buffer: &mut EpochBuffer) {
        assert!(buffer.record_range(range(1, 0, 5.0, 0.1)));
        assert!(buffer.record_range(range(0, 2, 3.2, 0.1)));
        assert!(buffer.record_pose(0, PoseObservation::identity(0.1)));
        assert!(buffer.record_pose(1, PoseObservation::identity(0.1)));
        assert!(buffer.record_control(0, control(1, 0.1)));
        assert!(buffer.record_control(1, control(2, 0.1)));
    }

    #[test]
    fn test_fresh_buffer_incomplete() {
        let buffer = ego_buffer();
        assert!(!buffer.is_complete());
        assert!(buffer.snapshot(AgentId::new(0), 1, 0.0).is_none());
    }

    #[test]
    fn test_either_direction_satisfies_pair() {
        let mut buffer = ego_buffer();
        // Reverse direction only for the 0-1 pair.
        buffer.record_range(range(1, 0, 5.0, 0.1));
        assert_eq!(buffer.fill_counts().ranges, 1);
    }

    #[test]
    fn test_unrecognized_pair_dropped() {
        let mut buffer = ego_buffer();
        assert!(!buffer.record_range(range(1, 2, 4.0, 0.1)));
        assert_eq!(buffer.fill_counts().ranges, 0);
    }

    #[test]
    fn test_complete_and_snapshot_shape() {
        let mut buffer = ego_buffer();
        fill(&mut buffer);
        assert!(buffer.is_complete());

        let bundle = buffer.snapshot(AgentId::new(0), 1, 0.2).unwrap();
        assert_eq!(bundle.ranges.len(), 2);
        assert_eq!(bundle.poses.len(), 2);
        assert_eq!(bundle.controls.len(), 2);
        assert_eq!(bundle.meta.filled_ranges, 2);
        assert_eq!(bundle.meta.expected_ranges, 2);

        // snapshot() does not mutate.
        assert!(buffer.is_complete());
    }

    #[test]
    fn test_take_resets_all_slots() {
        let mut buffer = ego_buffer();
        fill(&mut buffer);

        let bundle = buffer.take(AgentId::new(0), 1, 0.2);
        assert!(bundle.is_some());
        assert!(!buffer.is_complete());
        assert_eq!(buffer.fill_counts().ranges, 0);
        assert_eq!(buffer.fill_counts().poses, 0);
        assert_eq!(buffer.fill_counts().controls, 0);
    }

    #[test]
    fn test_overwrite_last_write_wins() {
        let mut buffer = ego_buffer();
        fill(&mut buffer);
        buffer.record_range(range(0, 2, 9.9, 0.15));

        let bundle = buffer.snapshot(AgentId::new(0), 1, 0.2).unwrap();
        let pair = bundle
            .ranges
            .iter()
            .find(|r| r.from == AgentId::new(0) && r.to == AgentId::new(2))
            .unwrap();
        assert_eq!(pair.distance, 9.9);
        assert_eq!(bundle.meta.overwrites, 1);
    }

    #[test]
    fn test_both_directions_later_timestamp_wins() {
        let mut buffer = ego_buffer();
        fill(&mut buffer);
        // Forward direction for 0-1 arrives later than the reverse one.
        buffer.record_range(range(0, 1, 5.5, 0.18));

        let bundle = buffer.snapshot(AgentId::new(0), 1, 0.2).unwrap();
        let pair = bundle
            .ranges
            .iter()
            .find(|r| {
                (r.from == AgentId::new(0) && r.to == AgentId::new(1))
                    || (r.from == AgentId::new(1) && r.to == AgentId::new(0))
            })
            .unwrap();
        assert_eq!(pair.distance, 5.5);
    }

    #[test]
    fn test_pose_index_out_of_range() {
        let mut buffer = ego_buffer();
        assert!(!buffer.record_pose(5, PoseObservation::identity(0.1)));
    }
}
