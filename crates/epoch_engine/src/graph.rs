//! Inter-agent connectivity graph.
//!
//! Built once from the global per-agent neighbor-list specification and
//! immutable afterwards. Edges are stored as canonical unordered pairs; an
//! edge {i, j} exists if it is listed in either agent's neighbor list.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{AgentId, ContractError};

/// Static inter-agent adjacency relation.
#[derive(Debug, Clone)]
pub struct ConnectivityGraph {
    /// Canonical (min, max) edge pairs
    edges: BTreeSet<(AgentId, AgentId)>,
    /// Per-agent neighbor lists from the config (sorted, deduped)
    neighborhoods: BTreeMap<AgentId, Vec<AgentId>>,
}

impl ConnectivityGraph {
    /// Build the full graph from the global adjacency specification.
    ///
    /// Symmetric closure is taken by construction: listing j under i is
    /// enough to create the edge {i, j}.
    pub fn build(adjacency: &BTreeMap<AgentId, Vec<AgentId>>) -> Self {
        let mut edges = BTreeSet::new();
        let mut neighborhoods = BTreeMap::new();

        for (&agent, neighbors) in adjacency {
            let mut listed: Vec<AgentId> = neighbors.clone();
            listed.sort_unstable();
            listed.dedup();

            for &neighbor in &listed {
                if neighbor != agent {
                    edges.insert(canonical(agent, neighbor));
                }
            }
            neighborhoods.insert(agent, listed);
        }

        Self {
            edges,
            neighborhoods,
        }
    }

    /// Restrict the graph to the edges incident to `ego`. The ego agent only
    /// collects ranges it is an endpoint of; an edge between two of its
    /// neighbors belongs to their epochs, not this one.
    ///
    /// # Errors
    /// `ConfigValidation` if `ego` has no entry in the adjacency
    /// specification; the agent cannot operate without its neighbor list.
    pub fn prune(&self, ego: AgentId) -> Result<Self, ContractError> {
        if !self.neighborhoods.contains_key(&ego) {
            return Err(ContractError::config_validation(
                "adjacency",
                format!("no entry for ego agent {}", ego.get()),
            ));
        }

        let edges: BTreeSet<(AgentId, AgentId)> = self
            .edges
            .iter()
            .copied()
            .filter(|&(a, b)| a == ego || b == ego)
            .collect();

        // Rebuild neighbor lists from the retained edges so the pruned view
        // is self-consistent. Ego keeps an entry even when isolated.
        let mut neighborhoods: BTreeMap<AgentId, Vec<AgentId>> = BTreeMap::new();
        neighborhoods.insert(ego, Vec::new());
        for &(a, b) in &edges {
            neighborhoods.entry(a).or_default().push(b);
            neighborhoods.entry(b).or_default().push(a);
        }
        for listed in neighborhoods.values_mut() {
            listed.sort_unstable();
        }

        Ok(Self {
            edges,
            neighborhoods,
        })
    }

    /// Check whether the unordered pair {a, b} is an edge.
    pub fn contains_edge(&self, a: AgentId, b: AgentId) -> bool {
        a != b && self.edges.contains(&canonical(a, b))
    }

    /// Listed neighbors of an agent, sorted.
    pub fn neighbors(&self, agent: AgentId) -> Option<&[AgentId]> {
        self.neighborhoods.get(&agent).map(Vec::as_slice)
    }

    /// Iterate over canonical (min, max) edge pairs.
    pub fn edges(&self) -> impl Iterator<Item = (AgentId, AgentId)> + '_ {
        self.edges.iter().copied()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[inline]
fn canonical(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(spec: &[(u32, &[u32])]) -> BTreeMap<AgentId, Vec<AgentId>> {
        spec.iter()
            .map(|&(agent, neighbors)| {
                (
                    AgentId::new(agent),
                    neighbors.iter().copied().map(AgentId::new).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_build_symmetric_closure() {
        // Edge listed only under agent 0 still exists both ways.
        let graph = ConnectivityGraph::build(&adjacency(&[(0, &[1]), (1, &[])]));
        assert!(graph.contains_edge(AgentId::new(0), AgentId::new(1)));
        assert!(graph.contains_edge(AgentId::new(1), AgentId::new(0)));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_prune_keeps_only_ego_edges() {
        // Line topology 0-1-2-3, ego = 1.
        let graph = ConnectivityGraph::build(&adjacency(&[
            (0, &[1]),
            (1, &[0, 2]),
            (2, &[1, 3]),
            (3, &[2]),
        ]));
        let pruned = graph.prune(AgentId::new(1)).unwrap();

        assert!(pruned.contains_edge(AgentId::new(0), AgentId::new(1)));
        assert!(pruned.contains_edge(AgentId::new(1), AgentId::new(2)));
        assert!(!pruned.contains_edge(AgentId::new(2), AgentId::new(3)));
        assert_eq!(pruned.edge_count(), 2);

        for (a, b) in pruned.edges() {
            assert!(a == AgentId::new(1) || b == AgentId::new(1));
        }
    }

    #[test]
    fn test_prune_drops_neighbor_to_neighbor_edges() {
        // Triangle: agent 0 does not collect the (1,2) range; that edge
        // belongs to the epochs of agents 1 and 2.
        let graph = ConnectivityGraph::build(&adjacency(&[
            (0, &[1, 2]),
            (1, &[0, 2]),
            (2, &[0, 1]),
        ]));
        let pruned = graph.prune(AgentId::new(0)).unwrap();
        assert!(!pruned.contains_edge(AgentId::new(1), AgentId::new(2)));
        assert!(pruned.contains_edge(AgentId::new(0), AgentId::new(1)));
        assert!(pruned.contains_edge(AgentId::new(0), AgentId::new(2)));
        assert_eq!(pruned.edge_count(), 2);
        assert_eq!(
            pruned.neighbors(AgentId::new(0)),
            Some(&[AgentId::new(1), AgentId::new(2)][..])
        );
    }

    #[test]
    fn test_prune_isolated_ego_keeps_entry() {
        let graph = ConnectivityGraph::build(&adjacency(&[(0, &[]), (1, &[2]), (2, &[1])]));
        let pruned = graph.prune(AgentId::new(0)).unwrap();
        assert_eq!(pruned.edge_count(), 0);
        assert_eq!(pruned.neighbors(AgentId::new(0)), Some(&[][..]));
    }

    #[test]
    fn test_prune_missing_ego_fails() {
        let graph = ConnectivityGraph::build(&adjacency(&[(1, &[2]), (2, &[1])]));
        let result = graph.prune(AgentId::new(0));
        assert!(matches!(
            result,
            Err(ContractError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_neighbors_sorted_and_deduped() {
        let graph = ConnectivityGraph::build(&adjacency(&[(0, &[2, 1, 2]), (1, &[]), (2, &[])]));
        assert_eq!(
            graph.neighbors(AgentId::new(0)),
            Some(&[AgentId::new(1), AgentId::new(2)][..])
        );
    }
}
