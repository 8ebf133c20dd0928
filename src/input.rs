use std::collections::BTreeMap;
use std::path::Path;

use ahash::{AHashMap, AHashSet};
use anyhow::{bail, ensure, Context, Result};
use geo::Coord;
use serde::{Deserialize, Serialize};
use topobuf::{Area, Node, NodeId, Ring, RingId};

use crate::topology::Topology;

/// A boundary vertex as delivered by the boundary-assembly service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

/// One exclave: an outer ring and its holes, as lists of source node ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePolygon {
    pub outer: Vec<u64>,
    #[serde(default)]
    pub inners: Vec<Vec<u64>>,
}

/// One administrative boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceArea {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub level: u8,
    pub polygons: Vec<SourcePolygon>,
}

/// The handoff document: nodes in source units (degrees) plus assembled areas.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryData {
    pub nodes: Vec<SourceNode>,
    pub areas: Vec<SourceArea>,
    /// Source relations the assembler could not complete; diagnostic only.
    #[serde(default)]
    pub incomplete_relations: usize,
}

/// Counts gathered while converting the handoff into buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputStats {
    pub areas_read: usize,
    pub areas_skipped: usize,
    pub rings_dropped: usize,
    pub rings_closed: usize,
    pub rings_reversed: usize,
}

impl BoundaryData {
    /// Parse a handoff document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("[BoundaryData.from_json_str] invalid boundary document")
    }

    /// Read a handoff document from a JSON file.
    pub fn read_from_json(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("[BoundaryData.read_from_json] cannot open {}", path.display()))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("[BoundaryData.read_from_json] cannot parse {}", path.display()))
    }

    /// Number of areas per level.
    pub fn level_counts(&self) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for area in &self.areas { *counts.entry(area.level).or_insert(0) += 1 }
        counts
    }

    /// The most frequent level; ties go to the higher (finer) level.
    pub fn detect_territory_level(&self) -> Option<u8> {
        self.level_counts().into_iter()
            .max_by(|(la, ca), (lb, cb)| ca.cmp(cb).then(la.cmp(lb)))
            .map(|(level, _)| level)
    }

    /// Build dense buffers from the areas whose level passes `keep_level`.
    ///
    /// Source ids are translated through per-kind lookup tables owned by this
    /// conversion. Open rings are closed, rings with fewer than three distinct
    /// nodes are dropped (with their holes when the ring is an outer), and
    /// winding is normalised to counter-clockwise outers and clockwise holes.
    /// Areas left without an outer ring are skipped. Unknown node references
    /// and duplicate ids are errors.
    #[tracing::instrument(skip_all)]
    pub fn into_topology(self, keep_level: impl Fn(u8) -> bool) -> Result<(Topology, InputStats)> {
        let mut topology = Topology::new();
        let mut stats = InputStats::default();

        let mut node_ids: AHashMap<u64, NodeId> = AHashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            ensure!(node.x.is_finite() && node.y.is_finite(),
                "[BoundaryData.into_topology] node {} has non-finite coordinates", node.id);
            let id = topology.nodes.next_id();
            if node_ids.insert(node.id, id).is_some() {
                bail!("[BoundaryData.into_topology] duplicate node id {}", node.id);
            }
            topology.nodes.append(Node::new(id, Coord { x: node.x, y: node.y }))?;
        }

        let mut area_ids: AHashSet<u64> = AHashSet::with_capacity(self.areas.len());
        for source in self.areas {
            ensure!(area_ids.insert(source.id), "[BoundaryData.into_topology] duplicate area id {}", source.id);
            if !keep_level(source.level) { continue }
            stats.areas_read += 1;

            let mut area = Area::new(topology.areas.next_id(), source.id, source.name, source.level);
            for polygon in &source.polygons {
                let Some(outer) = add_ring(&mut topology, &node_ids, &polygon.outer, true, &mut stats)
                    .with_context(|| format!("[BoundaryData.into_topology] area {}", source.id))?
                else {
                    stats.rings_dropped += polygon.inners.len();
                    continue;
                };
                area.outers.push(outer);

                let mut holes = Vec::with_capacity(polygon.inners.len());
                for inner in &polygon.inners {
                    let hole = add_ring(&mut topology, &node_ids, inner, false, &mut stats)
                        .with_context(|| format!("[BoundaryData.into_topology] area {}", source.id))?;
                    holes.extend(hole);
                }
                if !holes.is_empty() { area.inners.insert(outer, holes); }
            }

            if area.outers.is_empty() {
                tracing::warn!(area = source.id, name = %area.name, "area has no usable outer ring, skipped");
                stats.areas_skipped += 1;
                continue;
            }
            topology.areas.append(area)?;
        }

        let pruned = topology.prune_nodes()?;
        tracing::debug!(pruned, "dropped nodes not referenced by any kept area");

        if self.incomplete_relations > 0 {
            tracing::warn!(count = self.incomplete_relations, "source data contains incomplete relations");
        }
        tracing::info!(
            nodes = topology.nodes.len(), rings = topology.rings.len(), areas = topology.areas.len(),
            "loaded boundary topology",
        );

        Ok((topology, stats))
    }
}

/// Resolve, clean and append one ring. `None` if it has too few nodes.
fn add_ring(
    topology: &mut Topology,
    node_ids: &AHashMap<u64, NodeId>,
    source: &[u64],
    outer: bool,
    stats: &mut InputStats,
) -> Result<Option<RingId>> {
    let mut nodes: Vec<NodeId> = Vec::with_capacity(source.len() + 1);
    for raw in source {
        let Some(&id) = node_ids.get(raw) else { bail!("[BoundaryData.add_ring] unknown node id {raw}") };
        if nodes.last() != Some(&id) { nodes.push(id) }
    }

    if let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) {
        if first != last {
            nodes.push(first);
            stats.rings_closed += 1;
        }
    }

    let id = topology.rings.next_id();
    let mut ring = match Ring::new(id, nodes) {
        Ok(ring) => ring,
        Err(err) => {
            tracing::warn!(%err, "dropping ring");
            stats.rings_dropped += 1;
            return Ok(None);
        }
    };

    let line = topology.ring_line_of(&ring)?;
    let ccw = crate::geom::signed_area(&line) > 0.0;
    if ccw != outer {
        ring.reverse();
        stats.rings_reversed += 1;
    }

    Ok(Some(topology.rings.append(ring)?))
}
