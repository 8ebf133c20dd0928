use ahash::AHashMap;
use anyhow::Result;
use smallvec::SmallVec;
use topobuf::{AreaId, Components, DenseId, NodeId, UndirectedGraph};

use crate::config::Adjacency;
use crate::topology::Topology;

/// Areas referencing one boundary element; almost always one to three.
type Referrers = SmallVec<[AreaId; 4]>;

/// Finds neighbour relations and connected components among areas.
///
/// Two areas are neighbours when they are on the same level and share a
/// boundary node ([`Adjacency::Queen`]) or a boundary segment
/// ([`Adjacency::Rook`]). Areas on different levels never share an edge.
pub struct NeighborInspector<'a> {
    topology: &'a Topology,
    adjacency: Adjacency,
}

impl<'a> NeighborInspector<'a> {
    pub fn new(topology: &'a Topology, adjacency: Adjacency) -> Self { Self { topology, adjacency } }

    fn push(referrers: &mut Referrers, area: AreaId) {
        if referrers.last() != Some(&area) { referrers.push(area) }
    }

    /// Areas referencing each node, indexed by node id.
    fn node_referrers(&self) -> Vec<Referrers> {
        let mut referrers = vec![Referrers::new(); self.topology.nodes.len()];
        for area in &self.topology.areas {
            for ring in area.rings().filter_map(|r| self.topology.rings.get(r)) {
                for &n in ring.open_nodes() {
                    if let Some(list) = referrers.get_mut(n.index()) { Self::push(list, area.id) }
                }
            }
        }
        referrers
    }

    /// Areas referencing each undirected segment.
    fn segment_referrers(&self) -> AHashMap<(NodeId, NodeId), Referrers> {
        let mut referrers: AHashMap<(NodeId, NodeId), Referrers> = AHashMap::new();
        for area in &self.topology.areas {
            for ring in area.rings().filter_map(|r| self.topology.rings.get(r)) {
                for (a, b) in ring.segments() {
                    if a == b { continue }
                    Self::push(referrers.entry((a.min(b), a.max(b))).or_default(), area.id);
                }
            }
        }
        referrers
    }

    fn connect(&self, graph: &mut UndirectedGraph, areas: &[AreaId]) -> Result<()> {
        for (i, &a) in areas.iter().enumerate() {
            for &b in &areas[i + 1..] {
                if a != b && self.topology.areas[a].level == self.topology.areas[b].level {
                    graph.insert_edge(a, b)?;
                }
            }
        }
        Ok(())
    }

    /// Build the neighbour graph with one vertex per area.
    #[tracing::instrument(skip_all, fields(adjacency = ?self.adjacency))]
    pub fn build_graph(&self) -> Result<UndirectedGraph> {
        let mut graph = UndirectedGraph::new(self.topology.areas.len());
        match self.adjacency {
            Adjacency::Queen => {
                for areas in self.node_referrers().iter().filter(|r| r.len() > 1) {
                    self.connect(&mut graph, areas)?;
                }
            }
            Adjacency::Rook => {
                for areas in self.segment_referrers().values().filter(|r| r.len() > 1) {
                    self.connect(&mut graph, areas)?;
                }
            }
        }
        tracing::debug!(vertices = graph.vertex_count(), edges = graph.edge_count(), "built neighbour graph");
        Ok(graph)
    }

    /// Build the graph and label its connected components.
    pub fn relations(&self) -> Result<(UndirectedGraph, Components)> {
        let graph = self.build_graph()?;
        let components = connected_components(&graph);
        tracing::info!(edges = graph.edge_count(), components = components.len(), "inspected neighbours");
        Ok((graph, components))
    }
}

/// Connected components ("islands") of a neighbour graph.
#[inline]
pub fn connected_components(graph: &UndirectedGraph) -> Components {
    graph.connected_components()
}

/// Components whose members all lie on `level`, as member lists.
pub fn islands(topology: &Topology, components: &Components, level: u8) -> Vec<Vec<AreaId>> {
    components.groups().into_iter()
        .filter(|members| members.iter().all(|&a| topology.areas[a].level == level))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::fixtures::{add_area, square};

    /// Three unit squares in an L (a-b side by side, c below a) plus a
    /// fourth touching b only at a corner, and a detached island.
    fn layout() -> Topology {
        let mut topology = Topology::new();
        add_area(&mut topology, "a", 4, &square(0.0, 1.0, 1.0));
        add_area(&mut topology, "b", 4, &square(1.0, 1.0, 1.0));
        add_area(&mut topology, "c", 4, &square(0.0, 0.0, 1.0));
        add_area(&mut topology, "d", 4, &square(2.0, 2.0, 1.0));
        add_area(&mut topology, "island", 4, &square(9.0, 9.0, 1.0));
        topology
    }

    #[test]
    fn queen_adjacency_connects_corner_contacts() {
        let topology = layout();
        let graph = NeighborInspector::new(&topology, Adjacency::Queen).build_graph().unwrap();

        assert!(graph.contains_edge(AreaId(0), AreaId(1)));
        assert!(graph.contains_edge(AreaId(0), AreaId(2)));
        // b and c meet only at (1, 1)
        assert!(graph.contains_edge(AreaId(1), AreaId(2)));
        assert!(graph.contains_edge(AreaId(1), AreaId(3)));
        assert_eq!(graph.degree(AreaId(4)), 0);
    }

    #[test]
    fn rook_adjacency_requires_shared_segment() {
        let topology = layout();
        let graph = NeighborInspector::new(&topology, Adjacency::Rook).build_graph().unwrap();

        assert!(graph.contains_edge(AreaId(0), AreaId(1)));
        assert!(graph.contains_edge(AreaId(0), AreaId(2)));
        assert!(!graph.contains_edge(AreaId(1), AreaId(2)));
        assert!(!graph.contains_edge(AreaId(1), AreaId(3)));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn components_follow_adjacency() {
        let topology = layout();

        let (_, queen) = NeighborInspector::new(&topology, Adjacency::Queen).relations().unwrap();
        assert_eq!(queen.sizes(), &[4, 1]);

        let (_, rook) = NeighborInspector::new(&topology, Adjacency::Rook).relations().unwrap();
        assert_eq!(rook.sizes(), &[3, 1, 1]);
    }

    #[test]
    fn different_levels_are_never_neighbours() {
        let mut topology = Topology::new();
        add_area(&mut topology, "t1", 4, &square(0.0, 0.0, 1.0));
        add_area(&mut topology, "t2", 4, &square(1.0, 0.0, 1.0));
        add_area(&mut topology, "region", 2, &[(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)]);

        let (graph, components) = NeighborInspector::new(&topology, Adjacency::Queen).relations().unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(islands(&topology, &components, 4), vec![vec![AreaId(0), AreaId(1)]]);
        assert_eq!(islands(&topology, &components, 2), vec![vec![AreaId(2)]]);
    }

    #[test]
    fn empty_topology_has_no_components() {
        let topology = Topology::new();
        let (graph, components) = NeighborInspector::new(&topology, Adjacency::Queen).relations().unwrap();
        assert_eq!(graph.vertex_count(), 0);
        assert!(components.is_empty());
    }
}
