use ahash::AHashSet;
use anyhow::Result;
use geo::Coord;
use thiserror::Error;
use topobuf::{DenseId, NodeId, Ring, UndirectedGraph};

use crate::geom::perpendicular_distance;
use crate::topology::Topology;

/// Nodes with at least this many distinct neighbours are junctions.
pub const JUNCTION_DEGREE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimplifyError {
    #[error("line of {len} points is too short to simplify")]
    TooShort { len: usize },
}

/// Iterative Douglas-Peucker over `points`.
///
/// `removed` carries removals from earlier passes: such points are ignored
/// when searching for the farthest point and stay removed. Points for which
/// `protected` holds are never removed. The first and last point are never
/// touched.
pub fn douglas_peucker(
    points: &[Coord<f64>],
    tolerance: f64,
    removed: &mut [bool],
    protected: impl Fn(usize) -> bool,
) -> Result<(), SimplifyError> {
    if points.len() < 2 { return Err(SimplifyError::TooShort { len: points.len() }) }
    debug_assert_eq!(points.len(), removed.len());

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        let (mut index, mut d_max) = (start, 0.0);
        for i in start + 1..end {
            if removed[i] { continue }
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > d_max { (index, d_max) = (i, d) }
        }

        if d_max > tolerance {
            stack.push((start, index));
            stack.push((index, end));
        } else {
            for i in start + 1..end {
                if !protected(i) { removed[i] = true }
            }
        }
    }
    Ok(())
}

/// Removal mask of a standalone line, with the given points protected.
pub fn simplify(points: &[Coord<f64>], tolerance: f64, protected: impl Fn(usize) -> bool) -> Result<Vec<bool>, SimplifyError> {
    let mut removed = vec![false; points.len()];
    douglas_peucker(points, tolerance, &mut removed, protected)?;
    Ok(removed)
}

/// Simplified copy of a standalone line.
pub fn simplify_line(points: &[Coord<f64>], tolerance: f64) -> Result<Vec<Coord<f64>>, SimplifyError> {
    let removed = simplify(points, tolerance, |_| false)?;
    Ok(points.iter().zip(removed).filter(|(_, r)| !r).map(|(&p, _)| p).collect())
}

/// Counters reported by [`Compressor::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompressStats {
    pub nodes_before: usize,
    pub nodes_after: usize,
    pub junctions: usize,
    pub chains: usize,
    /// Rings that would have collapsed and kept all their nodes.
    pub rings_restored: usize,
}

/// Topology-aware simplification of every ring in a [`Topology`].
///
/// Rings are cut at junction nodes into chains. Every distinct chain is
/// simplified exactly once, so a boundary shared by two areas stays shared.
/// Junctions never move. A single node reindex runs at the end.
#[derive(Clone, Copy, Debug)]
pub struct Compressor {
    tolerance: f64,
}

impl Compressor {
    pub fn new(tolerance: f64) -> Self { Self { tolerance } }

    #[inline] pub fn tolerance(&self) -> f64 { self.tolerance }

    /// Number of distinct neighbouring nodes of every node, across all rings.
    pub fn node_degrees(topology: &Topology) -> Result<Vec<usize>> {
        let mut graph = UndirectedGraph::<NodeId>::new(topology.nodes.len());
        for ring in &topology.rings {
            for (a, b) in ring.segments() {
                if a != b { graph.insert_edge(a, b)?; }
            }
        }
        Ok(graph.vertices().map(|v| graph.degree(v)).collect())
    }

    #[tracing::instrument(skip_all, fields(tolerance = self.tolerance))]
    pub fn run(&self, topology: &mut Topology) -> Result<CompressStats> {
        let mut stats = CompressStats { nodes_before: topology.nodes.len(), ..Default::default() };
        if self.tolerance <= 0.0 {
            stats.nodes_after = stats.nodes_before;
            return Ok(stats);
        }

        let degrees = Self::node_degrees(topology)?;
        let is_junction = |n: NodeId| degrees[n.index()] >= JUNCTION_DEGREE;
        stats.junctions = degrees.iter().filter(|&&d| d >= JUNCTION_DEGREE).count();

        let mut removed = vec![false; topology.nodes.len()];
        let mut seen: AHashSet<Vec<NodeId>> = AHashSet::new();
        let mut points = Vec::new();
        let mut local = Vec::new();

        for ring in &topology.rings {
            for chain in chains(ring, &is_junction) {
                if !seen.insert(chain.clone()) { continue }
                stats.chains += 1;

                points.clear();
                for &n in &chain { points.push(topology.point(n)?) }
                local.clear();
                local.extend(chain.iter().map(|n| removed[n.index()]));

                if let Err(err) = douglas_peucker(&points, self.tolerance, &mut local, |i| is_junction(chain[i])) {
                    tracing::warn!(ring = %ring.id, %err, "chain skipped");
                    continue;
                }
                for (n, &r) in chain.iter().zip(&local) {
                    if r { removed[n.index()] = true }
                }
            }
        }

        // A ring may not lose so many nodes that it stops being a polygon.
        for ring in &topology.rings {
            let mut left: Vec<NodeId> = ring.open_nodes().iter().copied().filter(|n| !removed[n.index()]).collect();
            left.sort_unstable();
            left.dedup();
            if left.len() < 3 {
                tracing::warn!(ring = %ring.id, left = left.len(), "simplification would collapse ring, keeping its nodes");
                for n in ring.nodes() { removed[n.index()] = false }
                stats.rings_restored += 1;
            }
        }

        let keep: Vec<bool> = removed.iter().map(|r| !r).collect();
        topology.reindex_nodes(&keep)?;
        stats.nodes_after = topology.nodes.len();

        tracing::info!(
            before = stats.nodes_before, after = stats.nodes_after,
            chains = stats.chains, junctions = stats.junctions, "compressed boundaries",
        );
        Ok(stats)
    }
}

/// Split a ring into chains between junctions, each in canonical form.
///
/// A chain starts and ends at a junction (or, for a ring without junctions,
/// at its smallest node) and is oriented so that the same boundary walked in
/// either direction yields the same node sequence.
fn chains(ring: &Ring, is_junction: impl Fn(NodeId) -> bool) -> Vec<Vec<NodeId>> {
    let open = ring.open_nodes();
    let n = open.len();
    let cuts: Vec<usize> = (0..n).filter(|&i| is_junction(open[i])).collect();

    let mut chains = Vec::with_capacity(cuts.len().max(1));
    if cuts.is_empty() {
        let start = (0..n).min_by_key(|&i| open[i]).unwrap_or(0);
        let chain: Vec<NodeId> = (0..=n).map(|k| open[(start + k) % n]).collect();
        chains.push(canonical(chain));
        return chains;
    }

    for (k, &from) in cuts.iter().enumerate() {
        let to = cuts[(k + 1) % cuts.len()];
        let len = if to > from { to - from } else { to + n - from };
        let chain: Vec<NodeId> = (0..=len).map(|s| open[(from + s) % n]).collect();
        chains.push(canonical(chain));
    }
    chains
}

fn canonical(chain: Vec<NodeId>) -> Vec<NodeId> {
    let reversed: Vec<NodeId> = chain.iter().rev().copied().collect();
    if reversed < chain { reversed } else { chain }
}
