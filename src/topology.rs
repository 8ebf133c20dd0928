use anyhow::{ensure, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use topobuf::{Area, AreaBuffer, AreaId, DenseId, IdMap, NodeBuffer, NodeId, Ring, RingBuffer, RingId};

use crate::geom::multipolygon_area;

/// The node, ring and area buffers of one run.
///
/// Rings reference nodes and areas reference rings by id. Every removal goes
/// through one of the `reindex`/`retain` methods, which remap all dependent
/// references before returning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topology {
    pub nodes: NodeBuffer,
    pub rings: RingBuffer,
    pub areas: AreaBuffer,
}

impl Topology {
    pub fn new() -> Self { Self::default() }

    /// Coordinate of a node.
    #[inline]
    pub fn point(&self, node: NodeId) -> Result<Coord<f64>> {
        Ok(self.nodes.at(node)?.point)
    }

    /// Resolve a ring into its closed coordinate sequence.
    pub fn ring_line(&self, ring: RingId) -> Result<LineString<f64>> {
        self.ring_line_of(self.rings.at(ring)?)
    }

    /// Resolve a ring that need not be stored in the ring buffer.
    pub fn ring_line_of(&self, ring: &Ring) -> Result<LineString<f64>> {
        let coords = ring.nodes().iter()
            .map(|&n| self.point(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(LineString::new(coords))
    }

    /// Resolve an area into one polygon per outer ring.
    pub fn area_shape(&self, area: &Area) -> Result<MultiPolygon<f64>> {
        let polygons = area.outers.iter()
            .map(|&outer| {
                let holes = area.holes(outer).iter()
                    .map(|&hole| self.ring_line(hole))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Polygon::new(self.ring_line(outer)?, holes))
            })
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("[Topology.area_shape] area {} ({})", area.id, area.name))?;
        Ok(MultiPolygon(polygons))
    }

    /// Surface of an area: outer areas minus hole areas.
    pub fn area_surface(&self, area: &Area) -> Result<f64> {
        Ok(multipolygon_area(&self.area_shape(area)?))
    }

    /// Areas at the given level.
    pub fn areas_at_level(&self, level: u8) -> impl Iterator<Item = &Area> + '_ {
        self.areas.iter().filter(move |a| a.level == level)
    }

    /// Mask of nodes referenced by at least one ring.
    pub fn referenced_nodes(&self) -> Vec<bool> {
        let mut mask = vec![false; self.nodes.len()];
        for ring in &self.rings {
            for &n in ring.nodes() {
                if let Some(m) = mask.get_mut(n.index()) { *m = true }
            }
        }
        mask
    }

    /// Mask of rings referenced by at least one area.
    pub fn referenced_rings(&self) -> Vec<bool> {
        let mut mask = vec![false; self.rings.len()];
        for area in &self.areas {
            for r in area.rings() {
                if let Some(m) = mask.get_mut(r.index()) { *m = true }
            }
        }
        mask
    }

    /// Keep only the flagged nodes and remap every ring.
    pub fn reindex_nodes(&mut self, keep: &[bool]) -> Result<IdMap<NodeId>> {
        let (nodes, map) = std::mem::take(&mut self.nodes).reindex(keep)
            .context("[Topology.reindex_nodes] node buffer")?;
        self.nodes = nodes;
        if !map.is_identity() {
            for ring in self.rings.iter_mut() {
                ring.remap(&map).context("[Topology.reindex_nodes] ring remap")?;
            }
        }
        Ok(map)
    }

    /// Drop nodes no ring references. Returns how many were dropped.
    pub fn prune_nodes(&mut self) -> Result<usize> {
        let keep = self.referenced_nodes();
        Ok(self.reindex_nodes(&keep)?.dropped())
    }

    /// Detach from every surviving area the rings made up solely of nodes
    /// that the `removed` areas reference, together with the holes of a
    /// detached outer ring. Returns the surviving areas left without any
    /// outer ring; the caller removes them along with the flagged areas.
    pub fn detach_rings_of(&mut self, removed: &[bool]) -> Result<Vec<AreaId>> {
        ensure!(removed.len() == self.areas.len(),
            "[Topology.detach_rings_of] mask has {} entries for {} areas", removed.len(), self.areas.len());

        let mut covered = vec![false; self.nodes.len()];
        for area in self.areas.iter().filter(|a| removed[a.id.index()]) {
            for r in area.rings() {
                for &n in self.rings.at(r)?.nodes() { covered[n.index()] = true }
            }
        }
        let detached: Vec<bool> = self.rings.iter()
            .map(|ring| ring.nodes().iter().all(|n| covered.get(n.index()).copied().unwrap_or(false)))
            .collect();

        let mut emptied = Vec::new();
        for area in self.areas.iter_mut().filter(|a| !removed[a.id.index()]) {
            if !area.rings().any(|r| detached[r.index()]) { continue }

            area.outers.retain(|r| !detached[r.index()]);
            area.inners.retain(|outer, _| !detached[outer.index()]);
            for holes in area.inners.values_mut() { holes.retain(|r| !detached[r.index()]) }
            tracing::debug!(area = %area.id, name = %area.name, outers = area.outers.len(), "detached filtered rings");
            if area.outers.is_empty() { emptied.push(area.id) }
        }
        Ok(emptied)
    }

    /// Keep only the flagged areas, then drop rings and nodes that became
    /// unreferenced. Returns the area map; the graph over the old area ids
    /// must be remapped through it by the caller.
    pub fn retain_areas(&mut self, keep: &[bool]) -> Result<IdMap<AreaId>> {
        let (areas, area_map) = std::mem::take(&mut self.areas).reindex(keep)
            .context("[Topology.retain_areas] area buffer")?;
        self.areas = areas;

        let keep_rings = self.referenced_rings();
        let (rings, ring_map) = std::mem::take(&mut self.rings).reindex(&keep_rings)
            .context("[Topology.retain_areas] ring buffer")?;
        self.rings = rings;
        for area in self.areas.iter_mut() { area.remap(&ring_map) }

        self.prune_nodes()?;
        Ok(area_map)
    }

    /// Check that every reference points into its buffer.
    pub fn check_references(&self) -> Result<()> {
        for ring in &self.rings {
            for &n in ring.nodes() { self.nodes.at(n).with_context(|| format!("[Topology.check_references] {}", ring.id))?; }
        }
        for area in &self.areas {
            for r in area.rings() { self.rings.at(r).with_context(|| format!("[Topology.check_references] {}", area.id))?; }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn shared_coordinates_share_nodes() {
        let mut topology = Topology::new();
        add_area(&mut topology, "a", 4, &square(0.0, 0.0, 1.0));
        add_area(&mut topology, "b", 4, &square(1.0, 0.0, 1.0));
        assert_eq!(topology.nodes.len(), 6);
        topology.check_references().unwrap();
    }

    #[test]
    fn area_surface_uses_resolved_geometry() {
        let mut topology = Topology::new();
        let a = add_area(&mut topology, "a", 4, &square(0.0, 0.0, 3.0));
        let hole = add_ring(&mut topology, &[(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0)]);
        let outer = topology.areas[a].outers[0];
        topology.areas.at_mut(a).unwrap().inners.insert(outer, vec![hole]);

        assert_eq!(topology.area_surface(&topology.areas[a]).unwrap(), 8.0);
        assert_eq!(topology.area_shape(&topology.areas[a]).unwrap().0[0].interiors().len(), 1);
    }

    #[test]
    fn retain_areas_drops_orphaned_rings_and_nodes() {
        let mut topology = Topology::new();
        add_area(&mut topology, "a", 4, &square(0.0, 0.0, 1.0));
        add_area(&mut topology, "b", 4, &square(1.0, 0.0, 1.0));
        add_area(&mut topology, "c", 4, &square(5.0, 5.0, 1.0));

        let map = topology.retain_areas(&[true, false, true]).unwrap();

        assert_eq!(map.get(AreaId(2)), Some(AreaId(1)));
        assert_eq!(topology.areas.len(), 2);
        assert_eq!(topology.rings.len(), 2);
        assert_eq!(topology.nodes.len(), 8);
        assert_eq!(topology.areas[AreaId(1)].name, "c");
        assert_eq!(topology.areas[AreaId(1)].outers, vec![RingId(1)]);
        topology.check_references().unwrap();
        assert_eq!(topology.area_surface(&topology.areas[AreaId(1)]).unwrap(), 1.0);
    }

    #[test]
    fn prune_is_noop_on_referenced_nodes() {
        let mut topology = Topology::new();
        add_area(&mut topology, "a", 4, &square(0.0, 0.0, 1.0));
        let before = topology.clone();
        assert_eq!(topology.prune_nodes().unwrap(), 0);
        assert_eq!(topology, before);
    }

    #[test]
    fn detaching_strips_exclaves_over_removed_areas() {
        let mut topology = Topology::new();
        add_area(&mut topology, "main", 8, &square(0.0, 0.0, 2.0));
        add_area(&mut topology, "islet", 8, &square(10.0, 10.0, 1.0));
        let region = add_area(&mut topology, "region", 4, &square(0.0, 0.0, 2.0));
        let exclave = add_ring(&mut topology, &square(10.0, 10.0, 1.0));
        topology.areas.at_mut(region).unwrap().outers.push(exclave);
        add_area(&mut topology, "shore", 4, &square(10.0, 10.0, 1.0));

        let emptied = topology.detach_rings_of(&[false, true, false, false]).unwrap();
        assert_eq!(emptied, vec![AreaId(3)]);
        assert_eq!(topology.areas[region].outers, vec![RingId(2)]);

        let keep = [true, false, true, false];
        topology.retain_areas(&keep).unwrap();
        assert_eq!(topology.areas.len(), 2);
        assert_eq!(topology.rings.len(), 1);
        assert_eq!(topology.nodes.len(), 4);
        assert_eq!(topology.areas[AreaId(1)].outers, vec![RingId(1)]);
        topology.check_references().unwrap();
    }

    #[test]
    fn detaching_rejects_mask_length_mismatch() {
        let mut topology = Topology::new();
        add_area(&mut topology, "a", 4, &square(0.0, 0.0, 1.0));
        assert!(topology.detach_rings_of(&[]).is_err());
    }
}
