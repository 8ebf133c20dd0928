use anyhow::{Context, Result};

use crate::compressor::{CompressStats, Compressor};
use crate::config::MapConfig;
use crate::filter::{AreaFilter, FilterStats};
use crate::input::{BoundaryData, InputStats};
use crate::inspector::{connected_components, islands, NeighborInspector};
use crate::map::{Map, MapBuilder};
use crate::projection;

/// Counts reported by every stage of one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub territory_level: u8,
    pub input: InputStats,
    /// Incomplete source relations reported upstream.
    pub incomplete_relations: usize,
    pub compression: CompressStats,
    /// `None` when filtering is disabled.
    pub filter: Option<FilterStats>,
    /// Islands of territories in the final neighbour graph.
    pub components: usize,
    pub edges: usize,
    pub width: u32,
    pub height: u32,
    pub territories: usize,
    pub bonuses: usize,
    pub super_bonuses: usize,
    pub ungrouped_territories: usize,
}

/// Turn a boundary handoff into a finished map.
///
/// Stages run strictly in order: load, compress, inspect, filter, project,
/// build. Each stage consumes the buffers the previous one left behind.
#[tracing::instrument(skip_all, fields(map = %config.name))]
pub fn run(config: &MapConfig, data: BoundaryData) -> Result<(Map, Summary)> {
    config.validate()?;

    let territory_level = config.territory_level
        .or_else(|| data.detect_territory_level())
        .context("[pipeline.run] boundary data contains no areas")?;
    tracing::info!(territory_level, auto = config.territory_level.is_none(), "selected territory level");

    let mut summary = Summary {
        territory_level,
        incomplete_relations: data.incomplete_relations,
        ..Default::default()
    };

    let (mut topology, input) = data
        .into_topology(|level| level == territory_level || config.bonus_levels.contains(&level))
        .context("[pipeline.run] cannot load boundaries")?;
    summary.input = input;

    summary.compression = Compressor::new(config.compression_tolerance).run(&mut topology)
        .context("[pipeline.run] compression failed")?;

    let (mut graph, components) = NeighborInspector::new(&topology, config.adjacency).relations()
        .context("[pipeline.run] neighbour inspection failed")?;

    if config.filters() {
        let stats = AreaFilter::new(config.filter_tolerance, territory_level)
            .run(&mut topology, &mut graph, &components)
            .context("[pipeline.run] filtering failed")?;
        summary.filter = Some(stats);
    }
    summary.components = islands(&topology, &connected_components(&graph), territory_level).len();
    summary.edges = graph.edge_count();

    let fitted = projection::fit(config, topology.nodes.iter().map(|n| n.point))
        .context("[pipeline.run] cannot fit projection")?;
    fitted.projection.apply_to(&mut topology);
    summary.width = fitted.width;
    summary.height = fitted.height;

    let map = MapBuilder::new(config, territory_level)
        .build(&topology, &graph, fitted.width, fitted.height)
        .context("[pipeline.run] cannot build map")?;

    summary.territories = map.territories.len();
    summary.bonuses = map.bonuses.len();
    summary.super_bonuses = map.super_bonuses.len();
    summary.ungrouped_territories = map.ungrouped_territories().count();
    Ok((map, summary))
}
