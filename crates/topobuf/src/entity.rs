use std::collections::BTreeMap;

use geo::Coord;

use crate::buffer::{Entity, IdMap};
use crate::error::TopologyError;
use crate::ids::{AreaId, DenseId, NodeId, RingId};

/// A boundary vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub point: Coord<f64>,
}

impl Node {
    #[inline] pub fn new(id: NodeId, point: Coord<f64>) -> Self { Self { id, point } }
}

impl Entity for Node {
    type Id = NodeId;
    #[inline] fn id(&self) -> NodeId { self.id }
    #[inline] fn set_id(&mut self, id: NodeId) { self.id = id }
}

/// A closed sequence of node references (first == last).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ring {
    pub id: RingId,
    nodes: Vec<NodeId>,
}

impl Ring {
    /// Build a ring from a closed node list with at least 3 distinct nodes.
    pub fn new(id: RingId, nodes: Vec<NodeId>) -> Result<Self, TopologyError> {
        let distinct = distinct_count(&nodes);
        if distinct < 3 || nodes.first() != nodes.last() {
            return Err(TopologyError::ShortRing { ring: id.index(), distinct });
        }
        Ok(Self { id, nodes })
    }

    /// Closed node list, first node repeated at the end.
    #[inline] pub fn nodes(&self) -> &[NodeId] { &self.nodes }

    /// Node list without the closing repeat.
    #[inline] pub fn open_nodes(&self) -> &[NodeId] { &self.nodes[..self.nodes.len() - 1] }

    /// Number of stored nodes including the closing repeat.
    #[inline] pub fn len(&self) -> usize { self.nodes.len() }

    /// Rings always hold at least one node.
    #[inline] pub fn is_empty(&self) -> bool { false }

    #[inline] pub fn distinct_nodes(&self) -> usize { distinct_count(&self.nodes) }

    /// Consecutive node pairs, including the closing segment.
    pub fn segments(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.windows(2).map(|w| (w[0], w[1]))
    }

    /// Reverse the traversal direction.
    pub fn reverse(&mut self) { self.nodes.reverse() }

    /// Translate node references through `map`, dropping removed nodes.
    ///
    /// Consecutive duplicates are collapsed and the ring is re-closed. A ring
    /// left with fewer than two nodes is an invariant violation.
    pub fn remap(&mut self, map: &IdMap<NodeId>) -> Result<(), TopologyError> {
        let mut nodes: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for new in self.nodes.iter().filter_map(|&n| map.get(n)) {
            if nodes.last() != Some(&new) { nodes.push(new) }
        }
        if let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) {
            if first != last { nodes.push(first) }
        }
        if nodes.len() < 2 {
            return Err(TopologyError::DegenerateRing { ring: self.id.index(), nodes: nodes.len() });
        }
        self.nodes = nodes;
        Ok(())
    }
}

impl Entity for Ring {
    type Id = RingId;
    #[inline] fn id(&self) -> RingId { self.id }
    #[inline] fn set_id(&mut self, id: RingId) { self.id = id }
}

fn distinct_count(nodes: &[NodeId]) -> usize {
    let mut sorted = nodes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// One administrative boundary at one level.
///
/// An area may have several outer rings (exclaves); each outer ring owns the
/// inner rings (holes) listed under it in `inners`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Area {
    pub id: AreaId,
    pub source_id: u64,
    pub name: String,
    pub level: u8,
    pub outers: Vec<RingId>,
    pub inners: BTreeMap<RingId, Vec<RingId>>,
}

impl Area {
    pub fn new(id: AreaId, source_id: u64, name: impl Into<String>, level: u8) -> Self {
        Self { id, source_id, name: name.into(), level, outers: Vec::new(), inners: BTreeMap::new() }
    }

    /// Holes of the given outer ring.
    pub fn holes(&self, outer: RingId) -> &[RingId] {
        self.inners.get(&outer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every ring referenced by this area, outers first.
    pub fn rings(&self) -> impl Iterator<Item = RingId> + '_ {
        self.outers.iter().copied().chain(self.inners.values().flatten().copied())
    }

    /// Translate ring references through `map`, dropping removed rings.
    ///
    /// Holes of a removed outer ring are dropped with it.
    pub fn remap(&mut self, map: &IdMap<RingId>) {
        self.outers = self.outers.iter().filter_map(|&r| map.get(r)).collect();
        self.inners = std::mem::take(&mut self.inners).into_iter()
            .filter_map(|(outer, holes)| {
                let outer = map.get(outer)?;
                Some((outer, holes.into_iter().filter_map(|r| map.get(r)).collect()))
            })
            .collect();
    }
}

impl Entity for Area {
    type Id = AreaId;
    #[inline] fn id(&self) -> AreaId { self.id }
    #[inline] fn set_id(&mut self, id: AreaId) { self.id = id }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<NodeId> { raw.iter().map(|&n| NodeId(n)).collect() }

    #[test]
    fn ring_requires_closure_and_three_distinct_nodes() {
        assert!(Ring::new(RingId(0), ids(&[0, 1, 2, 0])).is_ok());
        assert_eq!(
            Ring::new(RingId(0), ids(&[0, 1, 0])),
            Err(TopologyError::ShortRing { ring: 0, distinct: 2 }),
        );
        assert!(Ring::new(RingId(0), ids(&[0, 1, 2, 3])).is_err());
    }

    #[test]
    fn ring_remap_drops_removed_nodes_and_stays_closed() {
        let mut ring = Ring::new(RingId(0), ids(&[0, 1, 2, 3, 0])).unwrap();
        let map = IdMap::from_keep_mask(&[true, false, true, true]);
        ring.remap(&map).unwrap();
        assert_eq!(ring.nodes(), ids(&[0, 1, 2, 0]).as_slice());
        assert_eq!(ring.open_nodes(), ids(&[0, 1, 2]).as_slice());
    }

    #[test]
    fn ring_remap_rejects_collapse() {
        let mut ring = Ring::new(RingId(4), ids(&[0, 1, 2, 0])).unwrap();
        let map = IdMap::from_keep_mask(&[false, true, false]);
        assert_eq!(ring.remap(&map), Err(TopologyError::DegenerateRing { ring: 4, nodes: 1 }));
    }

    #[test]
    fn area_remap_drops_holes_of_removed_outer() {
        let mut area = Area::new(AreaId(0), 77, "a", 4);
        area.outers = vec![RingId(0), RingId(2)];
        area.inners.insert(RingId(0), vec![RingId(1)]);
        area.inners.insert(RingId(2), vec![RingId(3)]);

        area.remap(&IdMap::from_keep_mask(&[false, false, true, true]));

        assert_eq!(area.outers, vec![RingId(0)]);
        assert_eq!(area.holes(RingId(0)), &[RingId(1)]);
        assert_eq!(area.rings().count(), 2);
    }
}
