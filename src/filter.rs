use anyhow::{ensure, Result};
use topobuf::{Components, DenseId, UndirectedGraph};

use crate::topology::Topology;

/// Counters reported by [`AreaFilter::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FilterStats {
    pub areas_before: usize,
    pub areas_after: usize,
    pub components_removed: usize,
    /// Areas on other levels dropped because every outer ring covered a
    /// removed component.
    pub containers_removed: usize,
    /// Summed surface of the filtered level before removal.
    pub total_surface: f64,
}

/// Removes islands whose share of the total surface at one level is below a
/// threshold, then reindexes the topology and the neighbour graph together.
///
/// Rings of other areas that only trace removed islands go with them, so a
/// bonus exclave over a removed island disappears and a bonus holding
/// nothing else is removed entirely.
#[derive(Clone, Copy, Debug)]
pub struct AreaFilter {
    tolerance: f64,
    level: u8,
}

impl AreaFilter {
    pub fn new(tolerance: f64, level: u8) -> Self { Self { tolerance, level } }

    #[inline] pub fn tolerance(&self) -> f64 { self.tolerance }

    /// Surface of every area, `0` for areas whose geometry is degenerate.
    pub fn surfaces(topology: &Topology) -> Result<Vec<f64>> {
        topology.areas.iter().map(|a| topology.area_surface(a)).collect()
    }

    /// Areas marked for removal. Only components made entirely of areas on
    /// the filtered level are candidates.
    pub fn removal_mask(&self, topology: &Topology, components: &Components) -> Result<(Vec<bool>, FilterStats)> {
        ensure!(components.labels().len() == topology.areas.len(),
            "[AreaFilter.removal_mask] {} component labels for {} areas",
            components.labels().len(), topology.areas.len());

        let surfaces = Self::surfaces(topology)?;
        let total: f64 = topology.areas.iter()
            .filter(|a| a.level == self.level)
            .map(|a| surfaces[a.id.index()])
            .sum();

        let mut stats = FilterStats { areas_before: topology.areas.len(), total_surface: total, ..Default::default() };
        let mut remove = vec![false; topology.areas.len()];
        if total <= 0.0 {
            tracing::warn!(level = self.level, "total surface is zero, nothing filtered");
            return Ok((remove, stats));
        }

        for members in components.groups() {
            if !members.iter().all(|&a| topology.areas[a].level == self.level) { continue }

            let surface: f64 = members.iter().map(|a| surfaces[a.index()]).sum();
            let share = surface / total;
            if share < self.tolerance {
                tracing::debug!(size = members.len(), share, "removing island");
                for a in &members { remove[a.index()] = true }
                stats.components_removed += 1;
            }
        }
        Ok((remove, stats))
    }

    /// Apply the filter. The graph is replaced by its restriction to the
    /// surviving areas; component labels computed before are stale afterwards.
    #[tracing::instrument(skip_all, fields(tolerance = self.tolerance, level = self.level))]
    pub fn run(&self, topology: &mut Topology, graph: &mut UndirectedGraph, components: &Components) -> Result<FilterStats> {
        ensure!(graph.vertex_count() == topology.areas.len(),
            "[AreaFilter.run] graph has {} vertices for {} areas", graph.vertex_count(), topology.areas.len());

        let (mut remove, mut stats) = self.removal_mask(topology, components)?;
        if stats.components_removed > 0 {
            for area in topology.detach_rings_of(&remove)? {
                remove[area.index()] = true;
                stats.containers_removed += 1;
            }
            let keep: Vec<bool> = remove.iter().map(|r| !r).collect();
            let map = topology.retain_areas(&keep)?;
            *graph = graph.remap(&map)?;
        }
        stats.areas_after = topology.areas.len();

        tracing::info!(
            before = stats.areas_before, after = stats.areas_after,
            removed_components = stats.components_removed, removed_containers = stats.containers_removed,
            "filtered areas",
        );
        Ok(stats)
    }
}
